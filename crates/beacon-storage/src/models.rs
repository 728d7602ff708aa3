// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw row representation and decoding into domain types.

use std::str::FromStr;

use beacon_core::time;
use beacon_core::{BeaconError, Notification, NotificationId, NotificationStatus};

/// A `notifications` row exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRow {
    pub id: String,
    pub message: String,
    pub start_time: String,
    pub end_time: String,
    pub device: String,
    pub status: String,
    pub repeat_count: i64,
    pub created_at: String,
}

impl NotificationRow {
    pub const COLUMNS: &'static str =
        "id, message, start_time, end_time, device, status, repeat_count, created_at";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            message: row.get(1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            device: row.get(4)?,
            status: row.get(5)?,
            repeat_count: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    /// Encodes a notification for writing; all instants in the storage format.
    pub fn encode(n: &Notification) -> Self {
        Self {
            id: n.id.to_string(),
            message: n.message.clone(),
            start_time: time::to_storage(n.start_time),
            end_time: time::to_storage(n.end_time),
            device: n.device.clone(),
            status: n.status.to_string(),
            repeat_count: i64::from(n.repeat_count),
            created_at: time::to_storage(n.created_at),
        }
    }

    /// Decodes timestamps (tolerating legacy encodings) and status.
    pub fn decode(self) -> Result<Notification, BeaconError> {
        let status = NotificationStatus::from_str(&self.status).map_err(|_| {
            BeaconError::Internal(format!("row {} has unknown status `{}`", self.id, self.status))
        })?;
        let repeat_count = u32::try_from(self.repeat_count.max(1)).unwrap_or(u32::MAX);

        Ok(Notification {
            start_time: time::parse_utc(&self.start_time)?,
            end_time: time::parse_utc(&self.end_time)?,
            created_at: time::parse_utc(&self.created_at)?,
            id: NotificationId(self.id),
            message: self.message,
            device: self.device,
            status,
            repeat_count,
        })
    }
}
