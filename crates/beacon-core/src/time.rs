// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clock and time normalization.
//!
//! Every instant the system stores or compares is a `DateTime<Utc>`. This
//! module is the only place that turns text into instants: the strict
//! RFC 3339 parser used at the API boundary, and the tolerant parser used
//! when reading rows that may have been written by older builds.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::error::BeaconError;

/// Textual format used when persisting timestamps (always UTC, no zone suffix).
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Zone-less layouts accepted on read, all interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Source of the current wall-clock instant.
///
/// The scheduler reads the clock once per tick; tests inject a manual clock.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Formats an instant for storage.
pub fn to_storage(instant: DateTime<Utc>) -> String {
    instant.format(STORAGE_FORMAT).to_string()
}

/// Parses a stored timestamp, tolerating the legacy encodings.
///
/// Accepts RFC 3339 with any offset (normalized to UTC) and the zone-less
/// space- or `T`-separated forms, which are taken to already be UTC.
pub fn parse_utc(raw: &str) -> Result<DateTime<Utc>, BeaconError> {
    let trimmed = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(BeaconError::Validation(format!(
        "unrecognized timestamp `{raw}`"
    )))
}

/// Parses a caller-supplied RFC 3339 timestamp, normalized to UTC and
/// truncated to the whole seconds that `STORAGE_FORMAT` keeps.
pub fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, BeaconError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc).trunc_subsecs(0))
        .map_err(|e| BeaconError::Validation(format!("`{raw}` is not an RFC 3339 timestamp: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn storage_format_is_space_separated_utc() {
        assert_eq!(to_storage(at(9, 5, 7)), "2026-03-14 09:05:07");
    }

    #[test]
    fn parses_space_separated_as_utc() {
        assert_eq!(parse_utc("2026-03-14 09:05:07").unwrap(), at(9, 5, 7));
    }

    #[test]
    fn parses_rfc3339_with_z_suffix() {
        assert_eq!(parse_utc("2026-03-14T09:05:07Z").unwrap(), at(9, 5, 7));
    }

    #[test]
    fn parses_rfc3339_offset_and_normalizes() {
        assert_eq!(parse_utc("2026-03-14T04:05:07-05:00").unwrap(), at(9, 5, 7));
    }

    #[test]
    fn parses_naive_t_separated_and_fractional() {
        assert_eq!(parse_utc("2026-03-14T09:05:07").unwrap(), at(9, 5, 7));
        let frac = parse_utc("2026-03-14 09:05:07.250").unwrap();
        assert_eq!(frac.timestamp(), at(9, 5, 7).timestamp());
    }

    #[test]
    fn storage_roundtrip_is_stable() {
        let instant = at(23, 59, 59);
        assert_eq!(parse_utc(&to_storage(instant)).unwrap(), instant);
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_utc("next tuesday").unwrap_err();
        assert!(matches!(err, BeaconError::Validation(_)));
    }

    #[test]
    fn strict_parser_rejects_zone_less_input() {
        assert!(parse_rfc3339("2026-03-14 09:05:07").is_err());
        assert_eq!(parse_rfc3339("2026-03-14T10:05:07+01:00").unwrap(), at(9, 5, 7));
    }

    #[test]
    fn strict_parser_drops_subseconds_like_storage() {
        let parsed = parse_rfc3339("2026-03-14T09:05:07.800Z").unwrap();
        assert_eq!(parsed, at(9, 5, 7));
        assert_eq!(parse_utc(&to_storage(parsed)).unwrap(), parsed);
    }

    #[test]
    fn system_clock_is_close_to_now() {
        let drift = (SystemClock.now() - Utc::now()).num_seconds().abs();
        assert!(drift <= 1);
    }
}
