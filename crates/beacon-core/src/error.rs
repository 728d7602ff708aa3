// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Beacon notification caster.

use thiserror::Error;

/// The primary error type used across all Beacon collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// Configuration errors (invalid TOML, bad timezone, missing command).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller errors rejected at the boundary (malformed timestamps, start >= end, unknown device).
    #[error("invalid notification: {0}")]
    Validation(String),

    /// A notification with the given id does not exist.
    #[error("notification not found: {0}")]
    NotFound(String),

    /// Device resolution or session establishment failed.
    ///
    /// Callers do not distinguish the two, so they share a variant.
    #[error("cast error: {message}")]
    Cast {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A session is already recorded for this notification.
    #[error("session already active for notification {0}")]
    SessionExists(String),

    /// Visual rendering, audio concatenation, or stream encoding failed.
    #[error("media error: {message}")]
    Media {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Narration synthesis failed.
    #[error("narration error: {message}")]
    Narration {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BeaconError {
    /// Shorthand for a [`BeaconError::Cast`] without an underlying source.
    pub fn cast(message: impl Into<String>) -> Self {
        BeaconError::Cast {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`BeaconError::Media`] without an underlying source.
    pub fn media(message: impl Into<String>) -> Self {
        BeaconError::Media {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a [`BeaconError::Narration`] without an underlying source.
    pub fn narration(message: impl Into<String>) -> Self {
        BeaconError::Narration {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps any error as a [`BeaconError::Storage`].
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        BeaconError::Storage {
            source: Box::new(source),
        }
    }

    /// Whether this error was caused by the caller rather than the system.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, BeaconError::Validation(_) | BeaconError::NotFound(_))
    }
}
