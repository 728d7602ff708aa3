// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cast session lifecycle and the `active`/`completed` status transitions.
//!
//! Per notification: `absent → starting → active → stopping → absent`.
//! The table lock only guards slot bookkeeping and is never held across an
//! await; device resolution, transport calls, and the settle delay all run
//! without it, so sessions for different notifications start and stop
//! concurrently.
//!
//! A start or stop future dropped part way (for example by a caller's
//! timeout) releases its slot on drop, and a start dropped after the device
//! connected cancels that session's token.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use beacon_core::{
    BeaconError, DeviceDirectory, DisplayTransport, MANIFEST_NAME, Notification, NotificationId,
    NotificationStatus, NotificationStore, SessionHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// URL a device fetches a notification's stream from.
pub fn media_url(base: &str, id: &NotificationId) -> String {
    format!("{}/media/{id}/{MANIFEST_NAME}", base.trim_end_matches('/'))
}

/// One live display session.
struct CastSession {
    handle: SessionHandle,
    cancel: CancellationToken,
    /// Cleared by the first stop; later stops see `false` and wait on `torn_down`.
    active: Mutex<bool>,
    /// Fired once the claiming stop has persisted `completed` or given up.
    torn_down: CancellationToken,
}

enum Slot {
    /// Reserved by an in-flight start.
    Starting,
    Live(Arc<CastSession>),
}

type SessionTable = Mutex<HashMap<NotificationId, Slot>>;

fn lock(table: &SessionTable) -> MutexGuard<'_, HashMap<NotificationId, Slot>> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a slot when dropped unless disarmed.
struct SlotRelease<'a> {
    table: &'a SessionTable,
    id: Option<NotificationId>,
}

impl<'a> SlotRelease<'a> {
    fn new(table: &'a SessionTable, id: NotificationId) -> Self {
        Self {
            table,
            id: Some(id),
        }
    }

    fn disarm(mut self) {
        self.id = None;
    }
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            lock(self.table).remove(&id);
        }
    }
}

pub struct SessionManager {
    sessions: SessionTable,
    directory: Arc<dyn DeviceDirectory>,
    transport: Arc<dyn DisplayTransport>,
    store: Arc<dyn NotificationStore>,
    media_base_url: String,
    settle_delay: Duration,
}

impl SessionManager {
    pub fn new(
        directory: Arc<dyn DeviceDirectory>,
        transport: Arc<dyn DisplayTransport>,
        store: Arc<dyn NotificationStore>,
        media_base_url: impl Into<String>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            directory,
            transport,
            store,
            media_base_url: media_base_url.into(),
            settle_delay,
        }
    }

    pub fn media_base_url(&self) -> &str {
        &self.media_base_url
    }

    /// Starts casting `notification` and persists it as `active`.
    ///
    /// Fails with [`BeaconError::SessionExists`] when a session for the same
    /// notification is starting or live. On any other failure nothing is
    /// recorded and the stored status is left alone.
    pub async fn start(&self, notification: &Notification) -> Result<SessionHandle, BeaconError> {
        let id = notification.id.clone();
        {
            let mut sessions = lock(&self.sessions);
            if sessions.contains_key(&id) {
                return Err(BeaconError::SessionExists(id.to_string()));
            }
            sessions.insert(id.clone(), Slot::Starting);
        }
        let reservation = SlotRelease::new(&self.sessions, id.clone());

        let session = self.establish(notification).await?;
        let handle = session.handle.clone();
        lock(&self.sessions).insert(id, Slot::Live(session));
        reservation.disarm();

        info!(
            notification_id = %notification.id,
            device = %handle.device.name,
            session_id = %handle.session_id,
            "session started"
        );
        Ok(handle)
    }

    async fn establish(&self, n: &Notification) -> Result<Arc<CastSession>, BeaconError> {
        let device = self.directory.resolve(&n.device).await?;
        let cancel = CancellationToken::new();
        let url = media_url(&self.media_base_url, &n.id);

        let handle = self
            .transport
            .start_session(&device, &url, cancel.clone())
            .await?;
        let unwind = cancel.clone().drop_guard();

        if let Err(e) = self.store.update_status(&n.id, NotificationStatus::Active).await {
            // The row may have been deleted while the device was connecting.
            drop(unwind);
            if let Err(cancel_err) = self.transport.cancel(&handle).await {
                debug!(notification_id = %n.id, error = %cancel_err, "cancel after failed persist");
            }
            return Err(e);
        }
        let _ = unwind.disarm();

        Ok(Arc::new(CastSession {
            handle,
            cancel,
            active: Mutex::new(true),
            torn_down: CancellationToken::new(),
        }))
    }

    /// Stops the session for `id` and persists `completed`.
    ///
    /// Returns `Ok(false)` without side effects when no live session is
    /// recorded. When another stop already claimed the session this waits
    /// for that teardown to finish, then returns `Ok(false)`.
    pub async fn stop(&self, id: &NotificationId) -> Result<bool, BeaconError> {
        let session = match lock(&self.sessions).get(id) {
            Some(Slot::Live(session)) => Arc::clone(session),
            Some(Slot::Starting) => {
                debug!(notification_id = %id, "stop requested while session is starting");
                return Ok(false);
            }
            None => return Ok(false),
        };

        let in_flight = {
            let mut active = session.active.lock().unwrap_or_else(PoisonError::into_inner);
            if *active {
                *active = false;
                None
            } else {
                Some(session.torn_down.clone())
            }
        };
        if let Some(torn_down) = in_flight {
            debug!(notification_id = %id, "waiting for in-flight stop");
            torn_down.cancelled().await;
            return Ok(false);
        }
        let _torn_down = session.torn_down.clone().drop_guard();
        let release = SlotRelease::new(&self.sessions, id.clone());

        session.cancel.cancel();
        if let Err(e) = self.transport.cancel(&session.handle).await {
            warn!(notification_id = %id, error = %e, "transport cancel failed, tearing down anyway");
        }
        tokio::time::sleep(self.settle_delay).await;
        drop(release);

        self.store
            .update_status(id, NotificationStatus::Completed)
            .await?;
        info!(
            notification_id = %id,
            device = %session.handle.device.name,
            "session stopped"
        );
        Ok(true)
    }

    /// Persists `completed` for a notification that has no session recorded.
    ///
    /// Covers rows left `active` by a previous process and `pending` rows
    /// whose window passed unseen. Returns `Ok(false)` when the row is
    /// already completed or no longer exists.
    pub async fn complete_without_session(&self, id: &NotificationId) -> Result<bool, BeaconError> {
        if lock(&self.sessions).contains_key(id) {
            return Err(BeaconError::SessionExists(id.to_string()));
        }
        match self.store.get(id).await? {
            Some(n) if !n.status.is_terminal() => {}
            _ => return Ok(false),
        }
        match self
            .store
            .update_status(id, NotificationStatus::Completed)
            .await
        {
            Ok(()) => Ok(true),
            Err(BeaconError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Stops every live session. Used on shutdown.
    pub async fn stop_all(&self) {
        let ids: Vec<NotificationId> = lock(&self.sessions)
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Live(_)))
            .map(|(id, _)| id.clone())
            .collect();
        if ids.is_empty() {
            return;
        }

        info!(count = ids.len(), "stopping live sessions");
        let stops = ids.iter().map(|id| async move { (id, self.stop(id).await) });
        for (id, result) in futures::future::join_all(stops).await {
            if let Err(e) = result {
                warn!(notification_id = %id, error = %e, "session stop during shutdown failed");
            }
        }
    }

    /// Whether a session for `id` is recorded, starting or live.
    pub fn is_recorded(&self, id: &NotificationId) -> bool {
        lock(&self.sessions).contains_key(id)
    }

    pub fn is_active(&self, id: &NotificationId) -> bool {
        matches!(lock(&self.sessions).get(id), Some(Slot::Live(_)))
    }

    pub fn active_count(&self) -> usize {
        lock(&self.sessions)
            .values()
            .filter(|slot| matches!(slot, Slot::Live(_)))
            .count()
    }
}
