// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Media capability providers used by the content preparation pipeline.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::BeaconError;

/// File name of the master manifest inside a notification's stream directory.
pub const MANIFEST_NAME: &str = "playlist.m3u8";

/// Text content of a rendered card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContent {
    pub title: String,
    /// Pre-wrapped message lines.
    pub lines: Vec<String>,
    /// Time-range footer, already in the display timezone.
    pub footer: String,
}

/// Renders a still visual for a notification.
///
/// Rendering is CPU-bound and synchronous; callers run it on a blocking thread.
pub trait VisualRenderer: Send + Sync + 'static {
    fn render(&self, card: &CardContent, output: &Path) -> Result<(), BeaconError>;
}

/// Converts text to narrated audio.
#[async_trait]
pub trait NarrationSynthesizer: Send + Sync + 'static {
    /// Writes the synthesized narration of `text` to `output`.
    async fn synthesize(&self, text: &str, output: &Path) -> Result<(), BeaconError>;
}

/// Parameters for the final combine step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub image: PathBuf,
    /// Narration track; `None` produces a silent stream.
    pub audio: Option<PathBuf>,
    pub duration_secs: u64,
    pub output_dir: PathBuf,
    pub manifest_name: String,
    pub segment_duration_secs: u64,
}

/// Audio/video encoding backend.
#[async_trait]
pub trait MediaEncoder: Send + Sync + 'static {
    /// Concatenates `input` with itself `times` times into `output`.
    async fn concat_audio(&self, input: &Path, times: u32, output: &Path)
    -> Result<(), BeaconError>;

    /// Combines image and optional audio into a segmented stream.
    ///
    /// Shorter audio is padded with silence up to `duration_secs`.
    async fn encode_stream(&self, request: &EncodeRequest) -> Result<(), BeaconError>;
}
