// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification CRUD operations.

use beacon_core::BeaconError;
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::NotificationRow;

/// Insert a new notification row.
pub async fn insert(db: &Database, row: NotificationRow) -> Result<(), BeaconError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO notifications
                 (id, message, start_time, end_time, device, status, repeat_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id,
                    row.message,
                    row.start_time,
                    row.end_time,
                    row.device,
                    row.status,
                    row.repeat_count,
                    row.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Get a row by ID.
pub async fn get(db: &Database, id: &str) -> Result<Option<NotificationRow>, BeaconError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {} FROM notifications WHERE id = ?1",
                NotificationRow::COLUMNS
            );
            let result = conn.query_row(&sql, params![id], NotificationRow::from_row);
            match result {
                Ok(row) => Ok(Some(row)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List rows, optionally restricted to one status.
///
/// `newest_first` selects the API listing order; scans use creation order.
pub async fn list(
    db: &Database,
    status: Option<String>,
    newest_first: bool,
) -> Result<Vec<NotificationRow>, BeaconError> {
    db.connection()
        .call(move |conn| {
            let order = if newest_first {
                "created_at DESC, rowid DESC"
            } else {
                "created_at ASC, rowid ASC"
            };
            let mut rows = Vec::new();
            match &status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {} FROM notifications WHERE status = ?1 ORDER BY {order}",
                        NotificationRow::COLUMNS
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    for row in stmt.query_map(params![status], NotificationRow::from_row)? {
                        rows.push(row?);
                    }
                }
                None => {
                    let sql = format!(
                        "SELECT {} FROM notifications ORDER BY {order}",
                        NotificationRow::COLUMNS
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    for row in stmt.query_map([], NotificationRow::from_row)? {
                        rows.push(row?);
                    }
                }
            }
            Ok(rows)
        })
        .await
        .map_err(map_tr_err)
}

/// Overwrite a row's status. Returns the number of rows changed.
pub async fn update_status(db: &Database, id: &str, status: &str) -> Result<usize, BeaconError> {
    let id = id.to_string();
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE notifications SET status = ?1 WHERE id = ?2",
                params![status, id],
            )?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a row. Returns the number of rows removed.
pub async fn delete(db: &Database, id: &str) -> Result<usize, BeaconError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let removed = conn.execute("DELETE FROM notifications WHERE id = ?1", params![id])?;
            Ok(removed)
        })
        .await
        .map_err(map_tr_err)
}
