// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content preparation pipeline.
//!
//! Sequence per notification: render card (fatal) → synthesize narration
//! (degraded) → repeat narration (falls back to single) → encode HLS stream
//! (fatal) → verify manifest (fatal). Each step is delegated to a provider;
//! this module only orders them and decides which failures abort.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use beacon_config::model::{MediaConfig, NarrationConfig};
use beacon_core::{
    BeaconError, CardContent, EncodeRequest, MAX_REPEAT_COUNT, MediaEncoder, NarrationSynthesizer,
    Notification, NotificationId, VisualRenderer,
};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactStore, MANIFEST_NAME};
use crate::dedup::{GenerationDeduplicator, GenerationGuard};
use crate::text;

/// How often a caller waiting on another caller's generation re-checks.
const WAIT_POLL: Duration = Duration::from_millis(100);

/// Layout and timing parameters of generated content.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub title: String,
    pub wrap_columns: usize,
    pub max_lines: usize,
    pub timezone: Tz,
    pub narration_template: String,
    pub narration_timeout: Duration,
    pub min_duration_secs: u64,
    pub segment_duration_secs: u64,
}

impl PipelineSettings {
    pub fn from_config(media: &MediaConfig, narration: &NarrationConfig) -> Result<Self, BeaconError> {
        let timezone = media.display_timezone.parse::<Tz>().map_err(|e| {
            BeaconError::Config(format!(
                "invalid display timezone `{}`: {e}",
                media.display_timezone
            ))
        })?;
        Ok(Self {
            title: media.title.clone(),
            wrap_columns: media.wrap_columns,
            max_lines: media.max_lines,
            timezone,
            narration_template: narration.template.clone(),
            narration_timeout: Duration::from_secs(narration.timeout_secs),
            min_duration_secs: media.min_duration_secs,
            segment_duration_secs: media.segment_duration_secs,
        })
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            title: "MEETING IN PROGRESS".into(),
            wrap_columns: 30,
            max_lines: 5,
            timezone: chrono_tz::America::New_York,
            narration_template: "In a meeting until {end}. Message: {message}".into(),
            narration_timeout: Duration::from_secs(30),
            min_duration_secs: 10,
            segment_duration_secs: 10,
        }
    }
}

/// Produces streamable artifacts for notifications.
pub struct ContentPipeline {
    artifacts: ArtifactStore,
    dedup: Arc<GenerationDeduplicator>,
    renderer: Arc<dyn VisualRenderer>,
    narrator: Arc<dyn NarrationSynthesizer>,
    encoder: Arc<dyn MediaEncoder>,
    settings: PipelineSettings,
    runs: AtomicU64,
}

impl ContentPipeline {
    pub fn new(
        artifacts: ArtifactStore,
        dedup: Arc<GenerationDeduplicator>,
        renderer: Arc<dyn VisualRenderer>,
        narrator: Arc<dyn NarrationSynthesizer>,
        encoder: Arc<dyn MediaEncoder>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            artifacts,
            dedup,
            renderer,
            narrator,
            encoder,
            settings,
            runs: AtomicU64::new(0),
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn dedup(&self) -> &Arc<GenerationDeduplicator> {
        &self.dedup
    }

    /// Number of generation runs started since construction.
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    pub async fn is_ready(&self, id: &NotificationId) -> bool {
        self.artifacts.is_ready(id).await
    }

    /// Stream length: the window in seconds, or the minimum when non-positive.
    pub fn stream_duration_secs(&self, n: &Notification) -> u64 {
        match u64::try_from(n.window_secs()) {
            Ok(secs) if secs > 0 => secs,
            _ => self.settings.min_duration_secs,
        }
    }

    pub fn card_for(&self, n: &Notification) -> CardContent {
        CardContent {
            title: self.settings.title.clone(),
            lines: text::wrap_text(&n.message, self.settings.wrap_columns, self.settings.max_lines),
            footer: text::time_range(n.start_time, n.end_time, self.settings.timezone),
        }
    }

    pub fn narration_for(&self, n: &Notification) -> String {
        text::narration_text(
            &self.settings.narration_template,
            &text::spoken_time(n.end_time, self.settings.timezone),
            &n.message,
        )
    }

    /// Returns the manifest location, generating the artifact if needed.
    ///
    /// Idempotent. When another caller is already generating the same
    /// notification this waits for it instead of starting a second run.
    pub async fn ensure_ready(&self, n: &Notification) -> Result<PathBuf, BeaconError> {
        if self.artifacts.is_ready(&n.id).await {
            return Ok(self.artifacts.manifest_path(&n.id));
        }

        if let Some(guard) = self.dedup.acquire(&n.id) {
            return self.generate(n, guard).await;
        }

        while self.dedup.is_in_progress(&n.id) {
            tokio::time::sleep(WAIT_POLL).await;
        }
        if self.artifacts.is_ready(&n.id).await {
            Ok(self.artifacts.manifest_path(&n.id))
        } else {
            Err(BeaconError::media(format!(
                "concurrent generation for {} did not produce an artifact",
                n.id
            )))
        }
    }

    /// Returns the card image location, rendering only the card if it is missing.
    pub async fn ensure_card(&self, n: &Notification) -> Result<PathBuf, BeaconError> {
        let path = self.artifacts.image_path(&n.id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
        self.artifacts.prepare(&n.id).await?;
        self.render_card(n).await?;
        debug!(notification_id = %n.id, "card rendered for preview");
        Ok(path)
    }

    /// Runs the pipeline while holding `guard`; the mark clears on return.
    pub async fn generate(
        &self,
        n: &Notification,
        guard: GenerationGuard,
    ) -> Result<PathBuf, BeaconError> {
        let _guard = guard;
        let manifest = self.artifacts.manifest_path(&n.id);

        // Another run may have finished between the caller's check and acquire.
        if self.artifacts.is_ready(&n.id).await {
            return Ok(manifest);
        }

        self.runs.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        info!(notification_id = %n.id, "content generation started");

        self.artifacts.prepare(&n.id).await?;
        self.render_card(n).await?;
        let audio = self.prepare_audio(n).await;

        let request = EncodeRequest {
            image: self.artifacts.image_path(&n.id),
            audio,
            duration_secs: self.stream_duration_secs(n),
            output_dir: self.artifacts.chunk_dir(&n.id),
            manifest_name: MANIFEST_NAME.to_string(),
            segment_duration_secs: self.settings.segment_duration_secs,
        };

        let encoded = self.encoder.encode_stream(&request).await;
        let verified = match encoded {
            Ok(()) if self.artifacts.is_ready(&n.id).await => Ok(()),
            Ok(()) => Err(BeaconError::media(format!(
                "encoder finished but {} is missing or empty",
                manifest.display()
            ))),
            Err(e) => Err(e),
        };
        if let Err(e) = verified {
            // A partial stream must not look ready to the activation scan.
            let _ = tokio::fs::remove_dir_all(self.artifacts.chunk_dir(&n.id)).await;
            return Err(e);
        }

        info!(
            notification_id = %n.id,
            duration_secs = request.duration_secs,
            narrated = request.audio.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "content generation finished"
        );
        Ok(manifest)
    }

    async fn render_card(&self, n: &Notification) -> Result<(), BeaconError> {
        let renderer = Arc::clone(&self.renderer);
        let card = self.card_for(n);
        let path = self.artifacts.image_path(&n.id);
        tokio::task::spawn_blocking(move || renderer.render(&card, &path))
            .await
            .map_err(|e| BeaconError::Media {
                message: "card rendering task failed".into(),
                source: Some(Box::new(e)),
            })?
    }

    /// Narration is best effort: any failure yields a silent stream.
    async fn prepare_audio(&self, n: &Notification) -> Option<PathBuf> {
        let single = self.artifacts.single_audio_path(&n.id);
        let utterance = self.narration_for(n);

        let synthesized = tokio::time::timeout(
            self.settings.narration_timeout,
            self.narrator.synthesize(&utterance, &single),
        )
        .await
        .unwrap_or(Err(BeaconError::Timeout {
            duration: self.settings.narration_timeout,
        }));
        if let Err(e) = synthesized {
            warn!(notification_id = %n.id, error = %e, "narration unavailable, continuing without audio");
            return None;
        }

        let times = repeat_times(n);
        if times <= 1 {
            return Some(single);
        }

        let repeated = self.artifacts.audio_path(&n.id);
        match self.encoder.concat_audio(&single, times, &repeated).await {
            Ok(()) => {
                debug!(notification_id = %n.id, times, "narration repeated");
                Some(repeated)
            }
            Err(e) => {
                warn!(notification_id = %n.id, error = %e, "narration repeat failed, using single narration");
                Some(single)
            }
        }
    }
}

/// Repeat count for a stored row. Rows written outside the API may carry
/// values above the accepted maximum.
fn repeat_times(n: &Notification) -> u32 {
    if n.repeat_count > MAX_REPEAT_COUNT {
        warn!(
            notification_id = %n.id,
            requested = n.repeat_count,
            max = MAX_REPEAT_COUNT,
            "repeat count clamped"
        );
    }
    n.repeat_count.clamp(1, MAX_REPEAT_COUNT)
}
