// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP text-to-speech client (Google Cloud Text-to-Speech wire format).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use beacon_config::model::NarrationConfig;
use beacon_core::{BeaconError, NarrationSynthesizer};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    sample_rate_hertz: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Narration synthesizer that calls a TTS REST endpoint and writes MP3.
///
/// When narration is disabled or no API key is configured every call fails,
/// which the pipeline treats as "continue without audio".
pub struct HttpNarrationSynthesizer {
    client: Option<reqwest::Client>,
    endpoint: String,
    language_code: String,
    voice: String,
    sample_rate_hz: u32,
}

impl HttpNarrationSynthesizer {
    pub fn new(config: &NarrationConfig) -> Result<Self, BeaconError> {
        let client = match (&config.api_key, config.enabled) {
            (Some(key), true) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    "x-goog-api-key",
                    HeaderValue::from_str(key).map_err(|e| {
                        BeaconError::Config(format!("invalid narration API key header value: {e}"))
                    })?,
                );
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                let client = reqwest::Client::builder()
                    .default_headers(headers)
                    .timeout(Duration::from_secs(config.timeout_secs))
                    .build()
                    .map_err(|e| BeaconError::Narration {
                        message: format!("failed to build HTTP client: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                Some(client)
            }
            _ => None,
        };

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language_code: config.language_code.clone(),
            voice: config.voice.clone(),
            sample_rate_hz: config.sample_rate_hz,
        })
    }

    /// Whether calls can succeed at all.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }
}

#[async_trait]
impl NarrationSynthesizer for HttpNarrationSynthesizer {
    async fn synthesize(&self, text: &str, output: &Path) -> Result<(), BeaconError> {
        let Some(client) = &self.client else {
            return Err(BeaconError::narration(
                "narration disabled or no API key configured",
            ));
        };

        let request = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: &self.voice,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
                sample_rate_hertz: self.sample_rate_hz,
            },
        };

        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| BeaconError::Narration {
                message: format!("TTS request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| BeaconError::Narration {
            message: format!("failed to read TTS response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        if !status.is_success() {
            return Err(BeaconError::narration(format!(
                "TTS endpoint returned {status}: {body}"
            )));
        }

        let parsed: SynthesizeResponse =
            serde_json::from_str(&body).map_err(|e| BeaconError::Narration {
                message: format!("failed to parse TTS response: {e}"),
                source: Some(Box::new(e)),
            })?;
        let audio = base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|e| BeaconError::Narration {
                message: format!("TTS audio is not valid base64: {e}"),
                source: Some(Box::new(e)),
            })?;
        if audio.is_empty() {
            return Err(BeaconError::narration("TTS returned empty audio"));
        }

        tokio::fs::write(output, &audio)
            .await
            .map_err(|e| BeaconError::Narration {
                message: format!("failed to write {}", output.display()),
                source: Some(Box::new(e)),
            })?;
        debug!(bytes = audio.len(), path = %output.display(), "narration written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: String) -> NarrationConfig {
        NarrationConfig {
            api_key: Some("test-key".into()),
            endpoint,
            ..NarrationConfig::default()
        }
    }

    #[tokio::test]
    async fn writes_decoded_audio() {
        let server = MockServer::start().await;
        let audio = base64::engine::general_purpose::STANDARD.encode(b"ID3fake-mp3");

        Mock::given(method("POST"))
            .and(path("/v1/text:synthesize"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "input": {"text": "hello"},
                "voice": {"languageCode": "en-US", "name": "en-US-Chirp-HD-F"},
                "audioConfig": {"audioEncoding": "MP3", "sampleRateHertz": 16000}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "audioContent": audio })),
            )
            .mount(&server)
            .await;

        let synth =
            HttpNarrationSynthesizer::new(&config(format!("{}/v1/text:synthesize", server.uri())))
                .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("n.mp3");
        synth.synthesize("hello", &out).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"ID3fake-mp3");
    }

    #[tokio::test]
    async fn error_status_is_narration_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota"))
            .mount(&server)
            .await;

        let synth = HttpNarrationSynthesizer::new(&config(server.uri())).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = synth
            .synthesize("hello", &dir.path().join("n.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, BeaconError::Narration { .. }));
    }

    #[tokio::test]
    async fn missing_key_fails_without_request() {
        let synth = HttpNarrationSynthesizer::new(&NarrationConfig::default()).unwrap();
        assert!(!synth.is_enabled());
        let err = synth
            .synthesize("hello", Path::new("/tmp/never.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, BeaconError::Narration { .. }));
    }
}
