// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the scheduling core around mock devices and media
//! providers: a temp SQLite store (or [`MemoryStore`]), a real artifact store
//! and content pipeline, and a real session manager. The clock is manual.

use std::sync::Arc;
use std::time::Duration;

use beacon_cast::SessionManager;
use beacon_config::model::{BeaconConfig, StorageConfig};
use beacon_core::{
    BeaconError, Clock, DeviceDirectory, NewNotification, Notification, NotificationId,
    NotificationStatus, NotificationStore,
};
use beacon_media::{ArtifactStore, ContentPipeline, GenerationDeduplicator, PipelineSettings};
use beacon_storage::SqliteNotificationStore;
use chrono::{DateTime, TimeZone, Utc};

use crate::clock::ManualClock;
use crate::mock_devices::{MockDirectory, MockTransport};
use crate::mock_media::{MockEncoder, MockNarrator, MockRenderer};
use crate::mock_store::MemoryStore;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    devices: Vec<String>,
    narrator: MockNarrator,
    memory_store: bool,
    start_time: DateTime<Utc>,
    settle_delay: Duration,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            devices: vec!["Office TV".to_string()],
            narrator: MockNarrator::new(),
            memory_store: false,
            start_time: Utc
                .with_ymd_and_hms(2026, 6, 1, 13, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            settle_delay: Duration::from_millis(1500),
        }
    }

    /// Replace the device names the directory knows.
    pub fn with_devices(mut self, names: &[&str]) -> Self {
        self.devices = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Use a preconfigured narrator, e.g. [`MockNarrator::gated`].
    pub fn with_narrator(mut self, narrator: MockNarrator) -> Self {
        self.narrator = narrator;
        self
    }

    /// Use [`MemoryStore`] instead of SQLite.
    pub fn with_memory_store(mut self) -> Self {
        self.memory_store = true;
        self
    }

    /// Initial reading of the manual clock.
    pub fn with_start_time(mut self, start: DateTime<Utc>) -> Self {
        self.start_time = start;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, BeaconError> {
        let temp_dir = tempfile::TempDir::new().map_err(BeaconError::storage)?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = BeaconConfig::default();
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        config.media.data_dir = temp_dir.path().join("data").to_string_lossy().to_string();
        config.cast.settle_delay_ms = self.settle_delay.as_millis() as u64;

        let (store, memory): (Arc<dyn NotificationStore>, Option<Arc<MemoryStore>>) =
            if self.memory_store {
                let memory = Arc::new(MemoryStore::new());
                (memory.clone() as Arc<dyn NotificationStore>, Some(memory))
            } else {
                let sqlite = SqliteNotificationStore::new(config.storage.clone());
                sqlite.initialize().await?;
                (Arc::new(sqlite) as Arc<dyn NotificationStore>, None)
            };

        let clock = Arc::new(ManualClock::new(self.start_time));
        let names: Vec<&str> = self.devices.iter().map(String::as_str).collect();
        let directory = Arc::new(MockDirectory::with_names(&names));
        let transport = Arc::new(MockTransport::new());
        let renderer = Arc::new(MockRenderer::new());
        let narrator = Arc::new(self.narrator);
        let encoder = Arc::new(MockEncoder::new());

        let pipeline = Arc::new(ContentPipeline::new(
            ArtifactStore::new(&config.media.data_dir),
            Arc::new(GenerationDeduplicator::new()),
            renderer.clone(),
            narrator.clone(),
            encoder.clone(),
            PipelineSettings::from_config(&config.media, &config.narration)?,
        ));
        let sessions = Arc::new(SessionManager::new(
            directory.clone(),
            transport.clone(),
            store.clone(),
            config.media_base_url(),
            self.settle_delay,
        ));

        Ok(TestHarness {
            clock,
            store,
            memory,
            directory,
            transport,
            renderer,
            narrator,
            encoder,
            pipeline,
            sessions,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock collaborators and temp storage.
pub struct TestHarness {
    pub clock: Arc<ManualClock>,
    /// Notification store (temp SQLite unless built with a memory store).
    pub store: Arc<dyn NotificationStore>,
    memory: Option<Arc<MemoryStore>>,
    pub directory: Arc<MockDirectory>,
    pub transport: Arc<MockTransport>,
    pub renderer: Arc<MockRenderer>,
    pub narrator: Arc<MockNarrator>,
    pub encoder: Arc<MockEncoder>,
    pub pipeline: Arc<ContentPipeline>,
    pub sessions: Arc<SessionManager>,
    /// Configuration the subsystems were built from.
    pub config: BeaconConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The in-memory store, when the harness was built with one.
    pub fn memory_store(&self) -> Option<&Arc<MemoryStore>> {
        self.memory.as_ref()
    }

    /// Creates a notification through the same validation the API uses.
    pub async fn create(
        &self,
        message: &str,
        device: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        repeat_count: Option<i64>,
    ) -> Result<Notification, BeaconError> {
        let request = NewNotification {
            message: message.to_string(),
            device: device.to_string(),
            start_time: start.to_rfc3339(),
            end_time: end.to_rfc3339(),
            repeat_count,
        };
        let notification = request.into_notification(self.clock.now())?;
        self.store.insert(&notification).await?;
        Ok(notification)
    }

    /// Schedules a message on the first device, `start_in` from now, lasting `length`.
    pub async fn schedule(
        &self,
        start_in: chrono::Duration,
        length: chrono::Duration,
    ) -> Result<Notification, BeaconError> {
        let now = self.clock.now();
        let device = self
            .directory
            .cached()
            .first()
            .map(|d| d.name.clone())
            .unwrap_or_default();
        self.create(
            "In a meeting, back soon",
            &device,
            now + start_in,
            now + start_in + length,
            None,
        )
        .await
    }

    pub async fn status(&self, id: &NotificationId) -> Result<Option<NotificationStatus>, BeaconError> {
        Ok(self.store.get(id).await?.map(|n| n.status))
    }

    pub async fn is_ready(&self, id: &NotificationId) -> bool {
        self.pipeline.is_ready(id).await
    }
}
