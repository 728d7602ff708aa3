// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence seam for notification rows.

use async_trait::async_trait;

use crate::error::BeaconError;
use crate::types::{Notification, NotificationFilter, NotificationId, NotificationStatus};

/// Durable storage for notifications.
///
/// No operation spans more than one statement. Status is the single source of
/// truth, so concurrent writers resolve last-write-wins.
#[async_trait]
pub trait NotificationStore: Send + Sync + 'static {
    /// Persists a new notification.
    async fn insert(&self, notification: &Notification) -> Result<(), BeaconError>;

    /// Fetches a single notification, `None` when absent.
    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>, BeaconError>;

    /// Lists every notification, newest first.
    async fn list(&self) -> Result<Vec<Notification>, BeaconError>;

    /// Lists notifications matching `filter`, in creation order.
    ///
    /// Rows whose timestamps cannot be decoded are skipped, never fatal.
    async fn list_by_status(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, BeaconError>;

    /// Overwrites the status of a notification.
    async fn update_status(
        &self,
        id: &NotificationId,
        status: NotificationStatus,
    ) -> Result<(), BeaconError>;

    /// Deletes a notification. Returns whether a row was removed.
    async fn delete(&self, id: &NotificationId) -> Result<bool, BeaconError>;
}
