// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Display transport that shells out to an external caster (e.g. `catt`).

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use beacon_config::model::CastConfig;
use beacon_core::{BeaconError, Device, DisplayTransport, SessionHandle};
use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::CommandTemplate;

/// Starts sessions by running `cast_command` and ends them by killing it.
///
/// A cast command may either return once playback has started or keep
/// running for the life of the session. In the second case the child is
/// supervised and killed when the session's cancellation token fires.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    cast: CommandTemplate,
    stop: Option<CommandTemplate>,
    start_window: Duration,
}

impl CommandTransport {
    pub fn new(
        cast: CommandTemplate,
        stop: Option<CommandTemplate>,
        start_window: Duration,
    ) -> Self {
        Self {
            cast,
            stop,
            start_window,
        }
    }

    /// An empty `stop_command` disables the stop step.
    pub fn from_config(config: &CastConfig) -> Result<Self, BeaconError> {
        Ok(Self::new(
            CommandTemplate::parse(&config.cast_command)?,
            config
                .stop_command
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(CommandTemplate::parse)
                .transpose()?,
            Duration::from_secs(config.start_timeout_secs),
        ))
    }
}

#[async_trait]
impl DisplayTransport for CommandTransport {
    async fn start_session(
        &self,
        device: &Device,
        media_url: &str,
        cancel: CancellationToken,
    ) -> Result<SessionHandle, BeaconError> {
        let mut child = self
            .cast
            .command_for(device, Some(media_url))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BeaconError::Cast {
                message: format!("failed to run `{}`", self.cast),
                source: Some(Box::new(e)),
            })?;

        let handle = SessionHandle {
            session_id: uuid::Uuid::new_v4().to_string(),
            device: device.clone(),
            media_url: media_url.to_string(),
        };

        match tokio::time::timeout(self.start_window, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                debug!(device = %device.name, "cast command returned, playback started");
            }
            Ok(Ok(status)) => {
                return Err(BeaconError::cast(format!(
                    "device `{}` rejected the stream ({status})",
                    device.name
                )));
            }
            Ok(Err(e)) => {
                return Err(BeaconError::Cast {
                    message: format!("failed to wait for `{}`", self.cast),
                    source: Some(Box::new(e)),
                });
            }
            Err(_) => {
                debug!(device = %device.name, "cast command still running, supervising");
                tokio::spawn(supervise(child, handle.session_id.clone(), cancel));
            }
        }

        info!(device = %device.name, session_id = %handle.session_id, "cast session started");
        Ok(handle)
    }

    async fn cancel(&self, handle: &SessionHandle) -> Result<(), BeaconError> {
        let Some(stop) = &self.stop else {
            return Ok(());
        };

        let mut command = stop.command_for(&handle.device, Some(&handle.media_url));
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let status = tokio::time::timeout(self.start_window, command.status())
            .await
            .map_err(|_| BeaconError::Timeout {
                duration: self.start_window,
            })?
            .map_err(|e| BeaconError::Cast {
                message: format!("failed to run `{stop}`"),
                source: Some(Box::new(e)),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(BeaconError::cast(format!("`{stop}` exited with {status}")))
        }
    }
}

/// Waits for either the child to exit or the session to be cancelled.
async fn supervise(mut child: Child, session_id: String, cancel: CancellationToken) {
    let cancelled = tokio::select! {
        _ = cancel.cancelled() => true,
        status = child.wait() => {
            match status {
                Ok(status) => debug!(%session_id, %status, "cast command exited"),
                Err(e) => warn!(%session_id, error = %e, "lost track of cast command"),
            }
            false
        }
    };

    if cancelled {
        if let Err(e) = child.kill().await {
            warn!(%session_id, error = %e, "failed to kill cast command");
        } else {
            debug!(%session_id, "cast command killed");
        }
    }
}
