// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Beacon notification caster.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Beacon configuration.
///
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BeaconConfig {
    /// Scheduler loop timing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Artifact rendering and encoding.
    #[serde(default)]
    pub media: MediaConfig,

    /// Text-to-speech narration.
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Device discovery and display transport.
    #[serde(default)]
    pub cast: CastConfig,

    /// HTTP gateway.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Scheduler loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// How far ahead of a start time content is pre-generated.
    #[serde(default = "default_pregeneration_horizon_secs")]
    pub pregeneration_horizon_secs: u64,

    /// Mark still-pending rows whose window already closed as completed.
    #[serde(default = "default_true")]
    pub complete_missed: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            pregeneration_horizon_secs: default_pregeneration_horizon_secs(),
            complete_missed: true,
        }
    }
}

fn default_tick_interval_secs() -> u64 {
    10
}

fn default_pregeneration_horizon_secs() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("beacon").join("beacon.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("beacon.db"))
        .to_string_lossy()
        .into_owned()
}

/// Media rendering and encoding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Root directory for generated images, audio, and stream chunks.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// ffmpeg executable (name on `PATH` or absolute path).
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// TrueType/OpenType font for the title line.
    #[serde(default = "default_bold_font_path")]
    pub title_font_path: Option<String>,

    /// Font for the message lines. Falls back to the title font.
    #[serde(default = "default_bold_font_path")]
    pub body_font_path: Option<String>,

    /// Font for the time range footer. Falls back to the body font.
    #[serde(default = "default_regular_font_path")]
    pub footer_font_path: Option<String>,

    /// IANA timezone used for times shown on screen and spoken.
    #[serde(default = "default_display_timezone")]
    pub display_timezone: String,

    /// Target HLS segment length.
    #[serde(default = "default_segment_duration_secs")]
    pub segment_duration_secs: u64,

    /// Column width for message word-wrap.
    #[serde(default = "default_wrap_columns")]
    pub wrap_columns: usize,

    /// Maximum number of wrapped message lines drawn.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    /// Heading drawn above the message.
    #[serde(default = "default_title")]
    pub title: String,

    /// Stream duration used when a window's length is non-positive.
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            ffmpeg_path: default_ffmpeg_path(),
            title_font_path: default_bold_font_path(),
            body_font_path: default_bold_font_path(),
            footer_font_path: default_regular_font_path(),
            display_timezone: default_display_timezone(),
            segment_duration_secs: default_segment_duration_secs(),
            wrap_columns: default_wrap_columns(),
            max_lines: default_max_lines(),
            width: default_width(),
            height: default_height(),
            title: default_title(),
            min_duration_secs: default_min_duration_secs(),
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_bold_font_path() -> Option<String> {
    Some("/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf".to_string())
}

fn default_regular_font_path() -> Option<String> {
    Some("/usr/share/fonts/dejavu/DejaVuSans.ttf".to_string())
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_display_timezone() -> String {
    "America/New_York".to_string()
}

fn default_segment_duration_secs() -> u64 {
    10
}

fn default_wrap_columns() -> usize {
    30
}

fn default_max_lines() -> usize {
    5
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    800
}

fn default_title() -> String {
    "MEETING IN PROGRESS".to_string()
}

fn default_min_duration_secs() -> u64 {
    10
}

/// Text-to-speech narration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NarrationConfig {
    /// Disabled narration produces silent streams.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// API key for the TTS endpoint. `None` behaves as a synthesis failure.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_voice")]
    pub voice: String,

    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: u32,

    /// Per-request timeout.
    #[serde(default = "default_tts_timeout_secs")]
    pub timeout_secs: u64,

    /// Utterance template. `{end}` is the end time, `{message}` the message text.
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            endpoint: default_tts_endpoint(),
            language_code: default_language_code(),
            voice: default_voice(),
            sample_rate_hz: default_sample_rate_hz(),
            timeout_secs: default_tts_timeout_secs(),
            template: default_template(),
        }
    }
}

fn default_tts_endpoint() -> String {
    "https://texttospeech.googleapis.com/v1/text:synthesize".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_voice() -> String {
    "en-US-Chirp-HD-F".to_string()
}

fn default_sample_rate_hz() -> u32 {
    16_000
}

fn default_tts_timeout_secs() -> u64 {
    30
}

fn default_template() -> String {
    "Hi, this is an automated message. I am in a meeting until {end} and left this message for you: {message}"
        .to_string()
}

/// A device declared directly in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StaticDevice {
    pub name: String,
    pub address: String,
}

/// Device discovery and display transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CastConfig {
    /// Devices that are always known, regardless of discovery.
    #[serde(default)]
    pub devices: Vec<StaticDevice>,

    /// External scan command; each stdout line is `<address> <name...>`.
    #[serde(default)]
    pub discovery_command: Option<String>,

    /// Command that starts casting. Placeholders: `{address}`, `{name}`, `{url}`.
    #[serde(default = "default_cast_command")]
    pub cast_command: String,

    /// Command run after a session is cancelled. Same placeholders.
    #[serde(default = "default_stop_command")]
    pub stop_command: Option<String>,

    #[serde(default = "default_discovery_timeout_secs")]
    pub discovery_timeout_secs: u64,

    /// Window in which a cast command exiting non-zero counts as a rejected
    /// start. A command still running when it closes is considered started.
    #[serde(default = "default_start_timeout_secs")]
    pub start_timeout_secs: u64,

    /// Grace period after cancelling a session before it is torn down.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Interval of the background discovery refresh.
    #[serde(default = "default_discovery_refresh_secs")]
    pub discovery_refresh_secs: u64,

    /// Base URL devices use to fetch media. Derived from the gateway when unset.
    #[serde(default)]
    pub media_base_url: Option<String>,
}

impl Default for CastConfig {
    fn default() -> Self {
        Self {
            devices: Vec::new(),
            discovery_command: None,
            cast_command: default_cast_command(),
            stop_command: default_stop_command(),
            discovery_timeout_secs: default_discovery_timeout_secs(),
            start_timeout_secs: default_start_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            discovery_refresh_secs: default_discovery_refresh_secs(),
            media_base_url: None,
        }
    }
}

fn default_cast_command() -> String {
    "catt -d {address} cast {url}".to_string()
}

fn default_stop_command() -> Option<String> {
    Some("catt -d {address} stop".to_string())
}

fn default_discovery_timeout_secs() -> u64 {
    10
}

fn default_start_timeout_secs() -> u64 {
    8
}

fn default_settle_delay_ms() -> u64 {
    1500
}

fn default_discovery_refresh_secs() -> u64 {
    120
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_gateway_host")]
    pub host: String,

    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl BeaconConfig {
    /// Base URL devices use to fetch media, without a trailing slash.
    ///
    /// A wildcard gateway host cannot be reached by a device, so it is
    /// replaced with `localhost` when no explicit base URL is configured.
    pub fn media_base_url(&self) -> String {
        match &self.cast.media_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let host = match self.gateway.host.as_str() {
                    "0.0.0.0" | "::" | "[::]" => "localhost",
                    other => other,
                };
                format!("http://{host}:{}", self.gateway.port)
            }
        }
    }
}
