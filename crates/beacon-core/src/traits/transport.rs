// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote display transport.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BeaconError;
use crate::types::Device;

/// Handle to an established display session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Transport-assigned session identifier.
    pub session_id: String,
    pub device: Device,
    pub media_url: String,
}

/// Drives a remote display to render a media location.
#[async_trait]
pub trait DisplayTransport: Send + Sync + 'static {
    /// Instructs `device` to start rendering `media_url`.
    ///
    /// Background work belonging to the session must observe `cancel` and
    /// unwind once it fires. Fails on an unreachable device or rejected media.
    async fn start_session(
        &self,
        device: &Device,
        media_url: &str,
        cancel: CancellationToken,
    ) -> Result<SessionHandle, BeaconError>;

    /// Tears a session down on the remote side. Best effort.
    async fn cancel(&self, handle: &SessionHandle) -> Result<(), BeaconError>;
}
