// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock media providers that write small placeholder files.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use beacon_core::{
    BeaconError, CardContent, EncodeRequest, MediaEncoder, NarrationSynthesizer, VisualRenderer,
};
use tokio::sync::Semaphore;

/// Bytes written per synthesized narration; one byte stands for one second.
pub const NARRATION_BYTES: &[u8] = b"narration";

/// Renderer that writes the card text instead of an image.
#[derive(Debug, Default)]
pub struct MockRenderer {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl VisualRenderer for MockRenderer {
    fn render(&self, card: &CardContent, output: &Path) -> Result<(), BeaconError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(BeaconError::media("mock renderer failure"));
        }
        let text = format!("{}\n{}\n{}", card.title, card.lines.join("\n"), card.footer);
        std::fs::write(output, text).map_err(BeaconError::storage)
    }
}

/// Narrator that can fail or be held until the test opens its gate.
#[derive(Debug)]
pub struct MockNarrator {
    calls: AtomicUsize,
    fail: AtomicBool,
    gate: Option<Semaphore>,
    texts: Mutex<Vec<String>>,
}

impl Default for MockNarrator {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            gate: None,
            texts: Mutex::new(Vec::new()),
        }
    }
}

impl MockNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A narrator whose calls block until [`MockNarrator::open_gate`].
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Lets every pending and future call through.
    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate
            && gate.available_permits() == 0
        {
            gate.add_permits(64);
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NarrationSynthesizer for MockNarrator {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<(), BeaconError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| BeaconError::narration(e.to_string()))?;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(BeaconError::narration("mock narrator failure"));
        }
        tokio::fs::write(output, NARRATION_BYTES)
            .await
            .map_err(BeaconError::storage)
    }
}

/// Encoder that writes an HLS master and media playlist without ffmpeg.
///
/// Audio length is modelled as file size; the media playlist always covers
/// exactly `duration_secs`, as real silence padding would.
#[derive(Debug, Default)]
pub struct MockEncoder {
    encodes: AtomicUsize,
    fail_concat: AtomicBool,
    fail_encode: AtomicBool,
    requests: Mutex<Vec<EncodeRequest>>,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_concat(&self, fail: bool) {
        self.fail_concat.store(fail, Ordering::SeqCst);
    }

    pub fn fail_encode(&self, fail: bool) {
        self.fail_encode.store(fail, Ordering::SeqCst);
    }

    pub fn encodes(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<EncodeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaEncoder for MockEncoder {
    async fn concat_audio(
        &self,
        input: &Path,
        times: u32,
        output: &Path,
    ) -> Result<(), BeaconError> {
        if self.fail_concat.load(Ordering::SeqCst) {
            return Err(BeaconError::media("mock concat failure"));
        }
        let single = tokio::fs::read(input).await.map_err(BeaconError::storage)?;
        tokio::fs::write(output, single.repeat(times as usize))
            .await
            .map_err(BeaconError::storage)
    }

    async fn encode_stream(&self, request: &EncodeRequest) -> Result<(), BeaconError> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_encode.load(Ordering::SeqCst) {
            return Err(BeaconError::media("mock encode failure"));
        }

        let segment = request.segment_duration_secs.max(1);
        let mut media = format!("#EXTM3U\n#EXT-X-TARGETDURATION:{segment}\n");
        let mut remaining = request.duration_secs;
        let mut index = 0;
        while remaining > 0 {
            let length = remaining.min(segment);
            let name = format!("{index}.ts");
            media.push_str(&format!("#EXTINF:{length}.000000,\n{name}\n"));
            tokio::fs::write(request.output_dir.join(&name), b"ts")
                .await
                .map_err(BeaconError::storage)?;
            remaining -= length;
            index += 1;
        }
        media.push_str("#EXT-X-ENDLIST\n");

        tokio::fs::write(request.output_dir.join("index.m3u8"), media)
            .await
            .map_err(BeaconError::storage)?;
        tokio::fs::write(
            request.output_dir.join(&request.manifest_name),
            "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=595200\nindex.m3u8\n",
        )
        .await
        .map_err(BeaconError::storage)
    }
}
