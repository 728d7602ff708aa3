// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Minimal HLS playlist reader for diagnostics and tests.
//!
//! Handles the two shapes the encoder writes: a master playlist listing one
//! variant, and a media playlist listing numbered segments.

use std::path::Path;

use beacon_core::BeaconError;

/// One media segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub duration_secs: f64,
    pub uri: String,
}

/// A parsed media playlist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaPlaylist {
    pub target_duration_secs: u64,
    pub segments: Vec<Segment>,
    /// `#EXT-X-ENDLIST` was present.
    pub complete: bool,
}

impl MediaPlaylist {
    pub fn total_duration_secs(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_secs).sum()
    }

    /// Parses playlist text. Unknown tags are ignored.
    pub fn parse(text: &str) -> Result<Self, BeaconError> {
        let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        if lines.next() != Some("#EXTM3U") {
            return Err(BeaconError::media("playlist does not start with #EXTM3U"));
        }

        let mut playlist = MediaPlaylist::default();
        let mut pending: Option<f64> = None;
        for line in lines {
            if let Some(value) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
                playlist.target_duration_secs = value
                    .parse()
                    .map_err(|_| BeaconError::media(format!("bad target duration `{value}`")))?;
            } else if let Some(value) = line.strip_prefix("#EXTINF:") {
                let secs = value.split(',').next().unwrap_or_default();
                pending = Some(
                    secs.parse()
                        .map_err(|_| BeaconError::media(format!("bad segment duration `{secs}`")))?,
                );
            } else if line == "#EXT-X-ENDLIST" {
                playlist.complete = true;
            } else if !line.starts_with('#') {
                let duration_secs = pending.take().ok_or_else(|| {
                    BeaconError::media(format!("segment `{line}` has no #EXTINF"))
                })?;
                playlist.segments.push(Segment {
                    duration_secs,
                    uri: line.to_string(),
                });
            }
        }
        Ok(playlist)
    }
}

/// URIs of the variant streams in a master playlist.
pub fn master_variants(text: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let mut expect_uri = false;
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if line.starts_with("#EXT-X-STREAM-INF") {
            expect_uri = true;
        } else if expect_uri && !line.starts_with('#') {
            variants.push(line.to_string());
            expect_uri = false;
        }
    }
    variants
}

/// Reads the stream behind a manifest, following a master playlist to its
/// first variant when needed.
pub async fn read_stream(manifest: &Path) -> Result<MediaPlaylist, BeaconError> {
    let text = read(manifest).await?;
    let Some(variant) = master_variants(&text).into_iter().next() else {
        return MediaPlaylist::parse(&text);
    };
    let dir = manifest.parent().unwrap_or_else(|| Path::new("."));
    MediaPlaylist::parse(&read(&dir.join(variant)).await?)
}

async fn read(path: &Path) -> Result<String, BeaconError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BeaconError::Media {
            message: format!("cannot read playlist {}", path.display()),
            source: Some(Box::new(e)),
        })
}
