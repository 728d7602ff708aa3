// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device discovery, display transport, and cast session lifecycle.
//!
//! [`SessionManager`] is the only component that moves a notification
//! between `pending`, `active`, and `completed`. It resolves devices through a
//! [`DeviceDirectory`](beacon_core::DeviceDirectory) (normally
//! [`CachedDirectory`]) and drives them through a
//! [`DisplayTransport`](beacon_core::DisplayTransport) (normally
//! [`CommandTransport`]).

pub mod command;
pub mod directory;
pub mod discovery;
pub mod session;
pub mod transport;

pub use directory::CachedDirectory;
pub use discovery::{CommandDiscovery, StaticDiscovery};
pub use session::{SessionManager, media_url};
pub use transport::CommandTransport;

use std::sync::Arc;
use std::time::Duration;

use beacon_config::model::CastConfig;
use beacon_core::{BeaconError, DeviceDiscovery};

/// Builds the discovery sources described by `[cast]`.
///
/// Static devices come first so that a configured address wins over a
/// scanned one when both report the same device.
pub fn discovery_sources(config: &CastConfig) -> Result<Vec<Arc<dyn DeviceDiscovery>>, BeaconError> {
    let mut sources: Vec<Arc<dyn DeviceDiscovery>> = Vec::new();
    if !config.devices.is_empty() {
        sources.push(Arc::new(StaticDiscovery::from_config(&config.devices)));
    }
    if let Some(command) = &config.discovery_command {
        sources.push(Arc::new(CommandDiscovery::new(
            command,
            Duration::from_secs(config.discovery_timeout_secs),
        )?));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_config::model::StaticDevice;

    #[test]
    fn builds_sources_from_config() {
        let mut config = CastConfig::default();
        assert!(discovery_sources(&config).unwrap().is_empty());

        config.devices.push(StaticDevice {
            name: "Office TV".into(),
            address: "10.0.0.5".into(),
        });
        config.discovery_command = Some("catt scan".into());
        let sources = discovery_sources(&config).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name(), "static");
        assert_eq!(sources[1].name(), "command");
    }

    #[test]
    fn blank_discovery_command_is_rejected() {
        let config = CastConfig {
            discovery_command: Some("   ".into()),
            ..CastConfig::default()
        };
        assert!(discovery_sources(&config).is_err());
    }
}
