// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content preparation for Beacon notifications.
//!
//! Turns a notification into a still card, a narrated audio track, and a
//! segmented HLS stream on disk. [`ContentPipeline::ensure_ready`] is the
//! single idempotent entry point; [`GenerationDeduplicator`] guarantees at
//! most one generation per notification is in flight.

pub mod artifacts;
pub mod dedup;
pub mod encoder;
pub mod manifest;
pub mod narration;
pub mod pipeline;
pub mod render;
pub mod text;

pub use artifacts::ArtifactStore;
pub use dedup::{GenerationDeduplicator, GenerationGuard};
pub use encoder::FfmpegEncoder;
pub use manifest::{MediaPlaylist, Segment};
pub use narration::HttpNarrationSynthesizer;
pub use pipeline::{ContentPipeline, PipelineSettings};
pub use render::FontCardRenderer;
