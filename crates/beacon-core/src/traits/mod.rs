// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The scheduler core only talks to the outside world through these seams.
//! Every async trait uses `#[async_trait]` so implementations can sit behind
//! `Arc<dyn Trait>`.

pub mod device;
pub mod media;
pub mod store;
pub mod transport;

pub use device::{DeviceDirectory, DeviceDiscovery};
pub use media::{
    CardContent, MANIFEST_NAME, EncodeRequest, MediaEncoder, NarrationSynthesizer, VisualRenderer,
};
pub use store::NotificationStore;
pub use transport::{DisplayTransport, SessionHandle};
