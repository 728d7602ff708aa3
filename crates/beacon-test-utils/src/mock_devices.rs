// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock device directory and display transport.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use beacon_core::{BeaconError, Device, DeviceDirectory, DisplayTransport, SessionHandle};
use tokio_util::sync::CancellationToken;

/// Directory with a fixed device list.
#[derive(Debug, Default)]
pub struct MockDirectory {
    devices: Mutex<Vec<Device>>,
}

impl MockDirectory {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Mutex::new(devices),
        }
    }

    /// Directory knowing one device per name, with made-up addresses.
    pub fn with_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| Device {
                    name: name.to_string(),
                    address: format!("192.0.2.{}", i + 10),
                })
                .collect(),
        )
    }

    pub fn set_devices(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }
}

#[async_trait]
impl DeviceDirectory for MockDirectory {
    async fn discover(&self) -> Result<Vec<Device>, BeaconError> {
        Ok(self.cached())
    }

    async fn resolve(&self, name: &str) -> Result<Device, BeaconError> {
        self.cached()
            .into_iter()
            .find(|d| d.name == name)
            .ok_or_else(|| BeaconError::cast(format!("device `{name}` not found")))
    }

    fn cached(&self) -> Vec<Device> {
        self.devices.lock().unwrap().clone()
    }
}

/// One recorded `start_session` call.
#[derive(Debug, Clone)]
pub struct StartedSession {
    pub handle: SessionHandle,
    pub token: CancellationToken,
}

/// Transport that records sessions instead of talking to devices.
#[derive(Debug, Default)]
pub struct MockTransport {
    started: Mutex<Vec<StartedSession>>,
    cancelled: Mutex<Vec<SessionHandle>>,
    fail_starts: AtomicBool,
    next_id: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every start fail as if the device were unreachable.
    pub fn fail_starts(&self, fail: bool) {
        self.fail_starts.store(fail, Ordering::SeqCst);
    }

    pub fn started(&self) -> Vec<StartedSession> {
        self.started.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<SessionHandle> {
        self.cancelled.lock().unwrap().clone()
    }

    /// Sessions started whose cancellation token has not fired.
    pub fn live_sessions(&self) -> usize {
        self.started
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.token.is_cancelled())
            .count()
    }
}

#[async_trait]
impl DisplayTransport for MockTransport {
    async fn start_session(
        &self,
        device: &Device,
        media_url: &str,
        cancel: CancellationToken,
    ) -> Result<SessionHandle, BeaconError> {
        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(BeaconError::cast(format!("device `{}` unreachable", device.name)));
        }
        let handle = SessionHandle {
            session_id: format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            device: device.clone(),
            media_url: media_url.to_string(),
        };
        self.started.lock().unwrap().push(StartedSession {
            handle: handle.clone(),
            token: cancel,
        });
        Ok(handle)
    }

    async fn cancel(&self, handle: &SessionHandle) -> Result<(), BeaconError> {
        self.cancelled.lock().unwrap().push(handle.clone());
        Ok(())
    }
}
