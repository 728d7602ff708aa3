// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: non-empty paths,
//! positive intervals, a parseable timezone, and template placeholders.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::BeaconConfig;

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &BeaconConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let positive = [
        ("scheduler.tick_interval_secs", config.scheduler.tick_interval_secs),
        (
            "scheduler.pregeneration_horizon_secs",
            config.scheduler.pregeneration_horizon_secs,
        ),
        ("media.segment_duration_secs", config.media.segment_duration_secs),
        ("media.min_duration_secs", config.media.min_duration_secs),
        ("narration.timeout_secs", config.narration.timeout_secs),
        ("cast.discovery_timeout_secs", config.cast.discovery_timeout_secs),
        ("cast.start_timeout_secs", config.cast.start_timeout_secs),
        ("cast.discovery_refresh_secs", config.cast.discovery_refresh_secs),
    ];
    for (key, value) in positive {
        if value == 0 {
            errors.push(ConfigError::validation(format!("{key} must be greater than 0")));
        }
    }

    for (key, value) in [
        ("storage.database_path", &config.storage.database_path),
        ("media.data_dir", &config.media.data_dir),
        ("media.ffmpeg_path", &config.media.ffmpeg_path),
        ("cast.cast_command", &config.cast.cast_command),
        ("gateway.host", &config.gateway.host),
    ] {
        if value.trim().is_empty() {
            errors.push(ConfigError::validation(format!("{key} must not be empty")));
        }
    }

    if config.media.wrap_columns == 0 || config.media.max_lines == 0 {
        errors.push(ConfigError::validation(
            "media.wrap_columns and media.max_lines must be at least 1",
        ));
    }

    if config.media.width < 64 || config.media.height < 64 {
        errors.push(ConfigError::validation(format!(
            "media dimensions {}x{} are too small (minimum 64x64)",
            config.media.width, config.media.height
        )));
    }

    if config
        .media
        .display_timezone
        .parse::<chrono_tz::Tz>()
        .is_err()
    {
        errors.push(ConfigError::validation(format!(
            "media.display_timezone `{}` is not a valid IANA timezone",
            config.media.display_timezone
        )));
    }

    if !config.narration.template.contains("{message}") {
        errors.push(ConfigError::validation(
            "narration.template must contain the `{message}` placeholder",
        ));
    }

    if !config.cast.cast_command.contains("{url}") {
        errors.push(ConfigError::validation(
            "cast.cast_command must contain the `{url}` placeholder",
        ));
    }

    let mut seen = HashSet::new();
    for (i, device) in config.cast.devices.iter().enumerate() {
        if device.name.trim().is_empty() || device.address.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "cast.devices[{i}] needs both a name and an address"
            )));
        }
        if !seen.insert(device.name.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate device name `{}` in cast.devices",
                device.name
            )));
        }
    }

    if let Some(url) = &config.cast.media_base_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        errors.push(ConfigError::validation(format!(
            "cast.media_base_url `{url}` must start with http:// or https://"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
