// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory notification store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use beacon_core::{
    BeaconError, Notification, NotificationFilter, NotificationId, NotificationStatus,
    NotificationStore,
};

/// [`NotificationStore`] backed by a `Vec`, in insertion order.
///
/// Every status write is appended to a transition log so tests can check
/// that statuses only ever move forward. Scans can be made to fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Notification>>,
    transitions: Mutex<Vec<(NotificationId, NotificationStatus, NotificationStatus)>>,
    fail_scans: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `list_by_status` call fail until reset.
    pub fn fail_scans(&self, fail: bool) {
        self.fail_scans.store(fail, Ordering::SeqCst);
    }

    /// `(id, from, to)` for every status write, in order.
    pub fn transitions(&self) -> Vec<(NotificationId, NotificationStatus, NotificationStatus)> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn status_of(&self, id: &NotificationId) -> Option<NotificationStatus> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|n| &n.id == id)
            .map(|n| n.status)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), BeaconError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|n| n.id == notification.id) {
            return Err(BeaconError::Validation(format!(
                "duplicate notification id {}",
                notification.id
            )));
        }
        rows.push(notification.clone());
        Ok(())
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>, BeaconError> {
        Ok(self.rows.lock().unwrap().iter().find(|n| &n.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Notification>, BeaconError> {
        Ok(self.rows.lock().unwrap().iter().rev().cloned().collect())
    }

    async fn list_by_status(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, BeaconError> {
        if self.fail_scans.load(Ordering::SeqCst) {
            return Err(BeaconError::storage(std::io::Error::other("injected scan failure")));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        status: NotificationStatus,
    ) -> Result<(), BeaconError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| BeaconError::NotFound(id.to_string()))?;
        self.transitions
            .lock()
            .unwrap()
            .push((id.clone(), row.status, status));
        row.status = status;
        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, BeaconError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|n| &n.id != id);
        Ok(rows.len() != before)
    }
}
