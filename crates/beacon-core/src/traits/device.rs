// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device discovery and resolution.

use async_trait::async_trait;

use crate::error::BeaconError;
use crate::types::Device;

/// A single source of devices (static list, network scan, external tool).
#[async_trait]
pub trait DeviceDiscovery: Send + Sync + 'static {
    /// Human-readable name of the source, used in logs.
    fn name(&self) -> &str;

    /// Performs one bounded scan.
    async fn scan(&self) -> Result<Vec<Device>, BeaconError>;
}

/// Best-effort directory of reachable devices.
#[async_trait]
pub trait DeviceDirectory: Send + Sync + 'static {
    /// Returns the live scan result, or the last known list if the scan came
    /// back empty.
    async fn discover(&self) -> Result<Vec<Device>, BeaconError>;

    /// Resolves a logical device name to an addressable device.
    ///
    /// Fails with [`BeaconError::Cast`] when no device of that name is found.
    async fn resolve(&self, name: &str) -> Result<Device, BeaconError>;

    /// Last successful discovery snapshot, without scanning.
    fn cached(&self) -> Vec<Device>;
}
