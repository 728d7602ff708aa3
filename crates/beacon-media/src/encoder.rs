// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ffmpeg-backed audio concatenation and HLS stream encoding.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use beacon_core::{BeaconError, EncodeRequest, MediaEncoder};
use tokio::process::Command;
use tracing::debug;

/// Name of the media playlist ffmpeg writes next to the master manifest.
pub const MEDIA_PLAYLIST_NAME: &str = "index.m3u8";

/// Lines of ffmpeg stderr kept in error messages.
const STDERR_TAIL_LINES: usize = 12;

/// Runs the system ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg_path: String,
    sample_rate_hz: u32,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<String>, sample_rate_hz: u32) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            sample_rate_hz,
        }
    }

    async fn run(&self, args: Vec<OsString>, what: &str) -> Result<(), BeaconError> {
        debug!(ffmpeg = %self.ffmpeg_path, ?args, "running ffmpeg");
        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| BeaconError::Media {
                message: format!("failed to spawn {} for {what}", self.ffmpeg_path),
                source: Some(Box::new(e)),
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        Err(BeaconError::media(format!(
            "ffmpeg {what} failed ({}): {tail}",
            output.status
        )))
    }
}

/// Arguments that concatenate `input` with itself `times` times.
pub fn concat_args(input: &Path, times: u32, output: &Path) -> Vec<OsString> {
    let times = times.max(1);
    let mut args: Vec<OsString> = vec!["-y".into()];
    for _ in 0..times {
        args.push("-i".into());
        args.push(input.into());
    }
    let inputs: String = (0..times).map(|i| format!("[{i}:a]")).collect();
    args.extend([
        "-filter_complex".into(),
        format!("{inputs}concat=n={times}:v=0:a=1[out]").into(),
        "-map".into(),
        "[out]".into(),
        output.into(),
    ]);
    args
}

/// Arguments that turn a still image plus optional narration into HLS.
///
/// Narration is followed by generated silence and the whole output is cut at
/// `duration_secs`, so the stream always lasts exactly the window.
pub fn stream_args(request: &EncodeRequest, sample_rate_hz: u32) -> Vec<OsString> {
    let duration = request.duration_secs.max(1).to_string();
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-loop".into(),
        "1".into(),
        "-framerate".into(),
        "1".into(),
        "-t".into(),
        duration.clone().into(),
        "-i".into(),
        request.image.clone().into(),
    ];

    if let Some(audio) = &request.audio {
        args.extend([
            "-i".into(),
            audio.clone().into(),
            "-f".into(),
            "lavfi".into(),
            "-t".into(),
            duration.clone().into(),
            "-i".into(),
            format!("anullsrc=r={sample_rate_hz}:cl=mono").into(),
            "-filter_complex".into(),
            "[1:a][2:a]concat=n=2:v=0:a=1[outa]".into(),
            "-map".into(),
            "0:v".into(),
            "-map".into(),
            "[outa]".into(),
            "-c:a".into(),
            "aac".into(),
            "-b:a".into(),
            "64k".into(),
            "-ar".into(),
            sample_rate_hz.to_string().into(),
            "-ac".into(),
            "1".into(),
            "-max_interleave_delta".into(),
            "0".into(),
        ]);
    }

    let segment_pattern = request.output_dir.join("%d.ts");
    args.extend([
        "-t".into(),
        duration.into(),
        "-preset".into(),
        "ultrafast".into(),
        "-c:v".into(),
        "libx264".into(),
        "-b:v".into(),
        "512k".into(),
        "-profile:v".into(),
        "baseline".into(),
        "-crf".into(),
        "28".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-threads".into(),
        "0".into(),
        "-f".into(),
        "hls".into(),
        "-hls_list_size".into(),
        "0".into(),
        "-hls_time".into(),
        request.segment_duration_secs.to_string().into(),
        "-hls_playlist_type".into(),
        "event".into(),
        "-hls_flags".into(),
        "independent_segments".into(),
        "-hls_segment_filename".into(),
        segment_pattern.into(),
        "-master_pl_name".into(),
        request.manifest_name.clone().into(),
        request.output_dir.join(MEDIA_PLAYLIST_NAME).into(),
    ]);
    args
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn concat_audio(
        &self,
        input: &Path,
        times: u32,
        output: &Path,
    ) -> Result<(), BeaconError> {
        self.run(concat_args(input, times, output), "audio concat").await
    }

    async fn encode_stream(&self, request: &EncodeRequest) -> Result<(), BeaconError> {
        self.run(stream_args(request, self.sample_rate_hz), "stream encode")
            .await
    }
}
