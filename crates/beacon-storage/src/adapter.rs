// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the NotificationStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use beacon_config::model::StorageConfig;
use beacon_core::{
    BeaconError, Notification, NotificationFilter, NotificationId, NotificationStatus,
    NotificationStore,
};

use crate::database::Database;
use crate::models::NotificationRow;
use crate::queries::notifications as q;

/// SQLite-backed notification store.
///
/// The database is opened on the first call to [`SqliteNotificationStore::initialize`].
pub struct SqliteNotificationStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteNotificationStore {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Wrap an already opened database.
    pub fn with_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Opens the database and applies migrations.
    pub async fn initialize(&self) -> Result<(), BeaconError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| BeaconError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoints the WAL before shutdown.
    pub async fn close(&self) -> Result<(), BeaconError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }

    fn db(&self) -> Result<&Database, BeaconError> {
        self.db.get().ok_or_else(|| BeaconError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Decodes rows, dropping any whose timestamps or status cannot be read.
    fn decode_all(rows: Vec<NotificationRow>) -> Vec<Notification> {
        rows.into_iter()
            .filter_map(|row| {
                let id = row.id.clone();
                match row.decode() {
                    Ok(n) => Some(n),
                    Err(e) => {
                        warn!(notification_id = %id, error = %e, "skipping undecodable notification row");
                        None
                    }
                }
            })
            .collect()
    }
}

#[async_trait]
impl NotificationStore for SqliteNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), BeaconError> {
        q::insert(self.db()?, NotificationRow::encode(notification)).await
    }

    async fn get(&self, id: &NotificationId) -> Result<Option<Notification>, BeaconError> {
        q::get(self.db()?, id.as_str())
            .await?
            .map(NotificationRow::decode)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Notification>, BeaconError> {
        let rows = q::list(self.db()?, None, true).await?;
        Ok(Self::decode_all(rows))
    }

    async fn list_by_status(
        &self,
        filter: &NotificationFilter,
    ) -> Result<Vec<Notification>, BeaconError> {
        // Time bounds are checked after decoding: stored text may mix encodings
        // that do not sort lexically.
        let rows = q::list(self.db()?, Some(filter.status.to_string()), false).await?;
        Ok(Self::decode_all(rows)
            .into_iter()
            .filter(|n| filter.matches(n))
            .collect())
    }

    async fn update_status(
        &self,
        id: &NotificationId,
        status: NotificationStatus,
    ) -> Result<(), BeaconError> {
        let changed = q::update_status(self.db()?, id.as_str(), &status.to_string()).await?;
        if changed == 0 {
            return Err(BeaconError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, BeaconError> {
        Ok(q::delete(self.db()?, id.as_str()).await? > 0)
    }
}
