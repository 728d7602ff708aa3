// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device discovery sources.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use beacon_config::model::StaticDevice;
use beacon_core::{BeaconError, Device, DeviceDiscovery};
use tracing::debug;

use crate::command::CommandTemplate;

/// Devices listed in configuration.
#[derive(Debug, Clone)]
pub struct StaticDiscovery {
    devices: Vec<Device>,
}

impl StaticDiscovery {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn from_config(devices: &[StaticDevice]) -> Self {
        Self::new(
            devices
                .iter()
                .map(|d| Device {
                    name: d.name.clone(),
                    address: d.address.clone(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl DeviceDiscovery for StaticDiscovery {
    fn name(&self) -> &str {
        "static"
    }

    async fn scan(&self) -> Result<Vec<Device>, BeaconError> {
        Ok(self.devices.clone())
    }
}

/// Runs an external scanner and parses its stdout.
#[derive(Debug, Clone)]
pub struct CommandDiscovery {
    template: CommandTemplate,
    timeout: Duration,
}

impl CommandDiscovery {
    pub fn new(command: &str, timeout: Duration) -> Result<Self, BeaconError> {
        Ok(Self {
            template: CommandTemplate::parse(command)?,
            timeout,
        })
    }
}

#[async_trait]
impl DeviceDiscovery for CommandDiscovery {
    fn name(&self) -> &str {
        "command"
    }

    async fn scan(&self) -> Result<Vec<Device>, BeaconError> {
        let argv = self.template.render(&[]);
        let mut command = tokio::process::Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| BeaconError::Timeout {
                duration: self.timeout,
            })?
            .map_err(|e| BeaconError::Cast {
                message: format!("failed to run discovery command `{}`", self.template),
                source: Some(Box::new(e)),
            })?;

        if !output.status.success() {
            return Err(BeaconError::cast(format!(
                "discovery command `{}` exited with {}",
                self.template, output.status
            )));
        }

        let devices = parse_scan_output(&String::from_utf8_lossy(&output.stdout));
        debug!(count = devices.len(), "discovery command finished");
        Ok(devices)
    }
}

/// Parses scanner output, one device per line.
///
/// Accepted shapes are `<address> <name>` and `<address> - <name> - <model>`.
/// Lines that do not start with an IP address (banners, blank lines) are
/// ignored. The first line for an address wins.
pub fn parse_scan_output(stdout: &str) -> Vec<Device> {
    let mut seen = HashSet::new();
    let mut devices = Vec::new();

    for line in stdout.lines() {
        let line = line.trim();
        let Some((address, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        if !is_address(address) {
            continue;
        }

        let rest = rest.trim_start();
        let rest = rest.strip_prefix("- ").unwrap_or(rest);
        let name = rest.split(" - ").next().unwrap_or_default().trim();
        if name.is_empty() || !seen.insert(address.to_string()) {
            continue;
        }
        devices.push(Device {
            name: name.to_string(),
            address: address.to_string(),
        });
    }
    devices
}

fn is_address(token: &str) -> bool {
    token.parse::<IpAddr>().is_ok() || token.parse::<SocketAddr>().is_ok()
}
