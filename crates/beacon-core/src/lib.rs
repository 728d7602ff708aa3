// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Beacon notification caster.
//!
//! This crate provides the error type, domain types, time normalization, and
//! the collaborator traits used throughout the Beacon workspace. Storage,
//! media, and cast crates implement the traits defined here.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::BeaconError;
pub use time::{Clock, SystemClock};
pub use types::{
    Device, MAX_REPEAT_COUNT, NewNotification, Notification, NotificationFilter, NotificationId,
    NotificationStatus,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    CardContent, DeviceDirectory, DeviceDiscovery, DisplayTransport, EncodeRequest, MANIFEST_NAME,
    MediaEncoder, NarrationSynthesizer, NotificationStore, SessionHandle, VisualRenderer,
};
