// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device directory with a last-known-good cache.
//!
//! Reads are two-tier: a live scan result when it found anything, otherwise
//! the snapshot of the last scan that did. Only [`CachedDirectory::discover`]
//! writes the snapshot.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use beacon_core::{BeaconError, Device, DeviceDirectory, DeviceDiscovery};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct CachedDirectory {
    sources: Vec<Arc<dyn DeviceDiscovery>>,
    scan_timeout: Duration,
    snapshot: ArcSwap<Vec<Device>>,
}

impl CachedDirectory {
    pub fn new(sources: Vec<Arc<dyn DeviceDiscovery>>, scan_timeout: Duration) -> Self {
        Self {
            sources,
            scan_timeout,
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Queries every source once and merges the results by address.
    ///
    /// A failing or slow source is logged and skipped.
    async fn scan_all(&self) -> Vec<Device> {
        let scans = self.sources.iter().map(|source| async move {
            let result = tokio::time::timeout(self.scan_timeout, source.scan())
                .await
                .unwrap_or(Err(BeaconError::Timeout {
                    duration: self.scan_timeout,
                }));
            (source.name(), result)
        });

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for (source, result) in futures::future::join_all(scans).await {
            match result {
                Ok(devices) => {
                    debug!(source, count = devices.len(), "discovery source scanned");
                    merged.extend(
                        devices
                            .into_iter()
                            .filter(|d| seen.insert(d.address.clone())),
                    );
                }
                Err(e) => warn!(source, error = %e, "discovery source failed"),
            }
        }
        merged
    }

    /// Spawns a task that re-runs discovery every `every` until `shutdown`.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        every: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let directory = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = directory.discover().await {
                            warn!(error = %e, "device refresh failed");
                        }
                    }
                    _ = shutdown.cancelled() => {
                        debug!("device refresh task shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[async_trait]
impl DeviceDirectory for CachedDirectory {
    async fn discover(&self) -> Result<Vec<Device>, BeaconError> {
        let live = self.scan_all().await;
        if live.is_empty() {
            let cached = self.cached();
            debug!(cached = cached.len(), "discovery found nothing, using last known devices");
            return Ok(cached);
        }

        let previous = self.snapshot.swap(Arc::new(live.clone()));
        if previous.len() != live.len() {
            info!(count = live.len(), "device list updated");
        }
        Ok(live)
    }

    async fn resolve(&self, name: &str) -> Result<Device, BeaconError> {
        let before = self.cached();
        let live = self.discover().await?;

        find_by_name(&live, name)
            .or_else(|| find_by_name(&before, name))
            .cloned()
            .ok_or_else(|| BeaconError::cast(format!("device `{name}` not found")))
    }

    fn cached(&self) -> Vec<Device> {
        self.snapshot.load().as_ref().clone()
    }
}

/// Exact match first, then case-insensitive.
fn find_by_name<'a>(devices: &'a [Device], name: &str) -> Option<&'a Device> {
    devices
        .iter()
        .find(|d| d.name == name)
        .or_else(|| devices.iter().find(|d| d.name.eq_ignore_ascii_case(name)))
}
