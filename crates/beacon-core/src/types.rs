// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the scheduler, session manager, and adapters.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::BeaconError;
use crate::time;

/// Opaque, immutable identifier of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl NotificationId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Active,
    Completed,
}

impl NotificationStatus {
    /// Whether moving from `self` to `next` is a forward transition.
    ///
    /// `Pending -> Completed` is only taken for windows that elapsed entirely
    /// while the process was not running.
    pub fn can_advance_to(self, next: NotificationStatus) -> bool {
        matches!(
            (self, next),
            (NotificationStatus::Pending, NotificationStatus::Active)
                | (NotificationStatus::Active, NotificationStatus::Completed)
                | (NotificationStatus::Pending, NotificationStatus::Completed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == NotificationStatus::Completed
    }
}

/// A scheduled message shown on a display device for a bounded window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub device: String,
    pub status: NotificationStatus,
    pub repeat_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Length of the display window in whole seconds (may be non-positive on bad data).
    pub fn window_secs(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }

    /// Whether `now` lies inside `[start, end)`.
    pub fn window_open_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }
}

/// A logical display target as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub address: String,
}

/// Upper bound on how many times the narration is repeated.
pub const MAX_REPEAT_COUNT: u32 = 20;

/// Caller input for creating a notification.
///
/// Timestamps arrive as RFC 3339 strings and are validated here, before
/// anything reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub message: String,
    pub device: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub repeat_count: Option<i64>,
}

impl NewNotification {
    /// Validates the request and builds a `pending` notification.
    pub fn into_notification(self, now: DateTime<Utc>) -> Result<Notification, BeaconError> {
        let device = self.device.trim().to_string();
        if device.is_empty() {
            return Err(BeaconError::Validation("device must not be empty".into()));
        }

        let start_time = time::parse_rfc3339(&self.start_time)?;
        let end_time = time::parse_rfc3339(&self.end_time)?;
        if start_time >= end_time {
            return Err(BeaconError::Validation(format!(
                "start_time ({}) must be before end_time ({})",
                self.start_time, self.end_time
            )));
        }

        let repeat_count = match self.repeat_count {
            Some(n) if n > i64::from(MAX_REPEAT_COUNT) => {
                return Err(BeaconError::Validation(format!(
                    "repeat_count must be at most {MAX_REPEAT_COUNT}, got {n}"
                )));
            }
            Some(n) if n >= 1 => n as u32,
            _ => 1,
        };

        Ok(Notification {
            id: NotificationId::generate(),
            message: self.message,
            start_time,
            end_time,
            device,
            status: NotificationStatus::Pending,
            repeat_count,
            created_at: now.trunc_subsecs(0),
        })
    }
}

/// Selection criteria for `NotificationStore::list_by_status`.
///
/// Bounds are half-open in the direction each name states: `start_after` is
/// exclusive, `start_at_or_before` inclusive, and likewise for end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFilter {
    pub status: NotificationStatus,
    pub start_after: Option<DateTime<Utc>>,
    pub start_at_or_before: Option<DateTime<Utc>>,
    pub end_after: Option<DateTime<Utc>>,
    pub end_at_or_before: Option<DateTime<Utc>>,
}

impl NotificationFilter {
    /// Matches every row with the given status.
    pub fn status(status: NotificationStatus) -> Self {
        Self {
            status,
            start_after: None,
            start_at_or_before: None,
            end_after: None,
            end_at_or_before: None,
        }
    }

    /// Pending rows starting in `(now, now + horizon]`.
    pub fn starting_within(now: DateTime<Utc>, horizon: Duration) -> Self {
        Self {
            start_after: Some(now),
            start_at_or_before: Some(now + horizon),
            ..Self::status(NotificationStatus::Pending)
        }
    }

    /// Pending rows with `start <= now < end`.
    pub fn window_open(now: DateTime<Utc>) -> Self {
        Self {
            start_at_or_before: Some(now),
            end_after: Some(now),
            ..Self::status(NotificationStatus::Pending)
        }
    }

    /// Active rows with `end <= now`.
    pub fn window_closed(now: DateTime<Utc>) -> Self {
        Self {
            end_at_or_before: Some(now),
            ..Self::status(NotificationStatus::Active)
        }
    }

    /// Pending rows whose whole window is already behind `now`.
    pub fn missed(now: DateTime<Utc>) -> Self {
        Self {
            end_at_or_before: Some(now),
            ..Self::status(NotificationStatus::Pending)
        }
    }

    /// Evaluates the filter against a decoded notification.
    pub fn matches(&self, n: &Notification) -> bool {
        n.status == self.status
            && self.start_after.is_none_or(|t| n.start_time > t)
            && self.start_at_or_before.is_none_or(|t| n.start_time <= t)
            && self.end_after.is_none_or(|t| n.end_time > t)
            && self.end_at_or_before.is_none_or(|t| n.end_time <= t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn sample(status: NotificationStatus, start_off: i64, end_off: i64) -> Notification {
        Notification {
            id: NotificationId::from("n-1"),
            message: "standup".into(),
            start_time: t0() + Duration::seconds(start_off),
            end_time: t0() + Duration::seconds(end_off),
            device: "Office TV".into(),
            status,
            repeat_count: 1,
            created_at: t0(),
        }
    }

    fn request(start: &str, end: &str) -> NewNotification {
        NewNotification {
            message: "Do not disturb".into(),
            device: "Office TV".into(),
            start_time: start.into(),
            end_time: end.into(),
            repeat_count: None,
        }
    }

    #[test]
    fn status_text_is_lowercase() {
        assert_eq!(NotificationStatus::Active.to_string(), "active");
        assert_eq!(
            NotificationStatus::from_str("completed").unwrap(),
            NotificationStatus::Completed
        );
        let json = serde_json::to_string(&NotificationStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }

    #[test]
    fn status_never_regresses() {
        use NotificationStatus::*;
        assert!(Pending.can_advance_to(Active));
        assert!(Active.can_advance_to(Completed));
        assert!(Pending.can_advance_to(Completed));
        assert!(!Active.can_advance_to(Pending));
        assert!(!Completed.can_advance_to(Active));
        assert!(!Completed.can_advance_to(Pending));
        assert!(!Active.can_advance_to(Active));
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(NotificationId::generate(), NotificationId::generate());
    }

    #[test]
    fn new_notification_rejects_start_not_before_end() {
        let same = request("2026-05-01T12:00:00Z", "2026-05-01T12:00:00Z");
        assert!(matches!(
            same.into_notification(t0()),
            Err(BeaconError::Validation(_))
        ));
        let reversed = request("2026-05-01T12:01:00Z", "2026-05-01T12:00:00Z");
        assert!(reversed.into_notification(t0()).is_err());
    }

    #[test]
    fn new_notification_rejects_malformed_times_and_blank_device() {
        assert!(request("tomorrow", "2026-05-01T12:00:00Z")
            .into_notification(t0())
            .is_err());
        let mut blank = request("2026-05-01T12:00:00Z", "2026-05-01T12:01:00Z");
        blank.device = "  ".into();
        assert!(blank.into_notification(t0()).is_err());
    }

    #[test]
    fn new_notification_normalizes_offsets_and_defaults_repeat() {
        let mut req = request("2026-05-01T08:00:00-04:00", "2026-05-01T08:01:00-04:00");
        req.repeat_count = Some(0);
        let n = req.into_notification(t0()).unwrap();
        assert_eq!(n.start_time, t0());
        assert_eq!(n.window_secs(), 60);
        assert_eq!(n.repeat_count, 1);
        assert_eq!(n.status, NotificationStatus::Pending);
        assert_eq!(n.created_at, t0());
    }

    #[test]
    fn new_notification_keeps_positive_repeat() {
        let mut req = request("2026-05-01T12:00:00Z", "2026-05-01T12:01:00Z");
        req.repeat_count = Some(3);
        assert_eq!(req.into_notification(t0()).unwrap().repeat_count, 3);
    }

    #[test]
    fn new_notification_rejects_excessive_repeat() {
        let mut req = request("2026-05-01T12:00:00Z", "2026-05-01T12:01:00Z");
        req.repeat_count = Some(i64::MAX);
        let err = req.clone().into_notification(t0()).unwrap_err();
        assert!(matches!(err, BeaconError::Validation(_)));

        req.repeat_count = Some(i64::from(MAX_REPEAT_COUNT) + 1);
        assert!(req.clone().into_notification(t0()).is_err());

        req.repeat_count = Some(i64::from(MAX_REPEAT_COUNT));
        assert_eq!(req.into_notification(t0()).unwrap().repeat_count, MAX_REPEAT_COUNT);
    }

    #[test]
    fn sub_second_window_is_rejected_after_truncation() {
        let req = request("2026-06-01T10:00:00.200Z", "2026-06-01T10:00:00.800Z");
        assert!(matches!(
            req.into_notification(t0()),
            Err(BeaconError::Validation(_))
        ));
    }

    #[test]
    fn accepted_times_survive_storage_encoding() {
        let req = request("2026-06-01T10:00:00.200Z", "2026-06-01T10:00:01.900Z");
        let n = req
            .into_notification(t0() + Duration::milliseconds(450))
            .unwrap();
        assert_eq!(n.window_secs(), 1);
        for instant in [n.start_time, n.end_time, n.created_at] {
            assert_eq!(time::parse_utc(&time::to_storage(instant)).unwrap(), instant);
        }
        assert!(n.start_time < n.end_time);
    }

    #[test]
    fn horizon_filter_is_exclusive_below_inclusive_above() {
        let f = NotificationFilter::starting_within(t0(), Duration::minutes(5));
        assert!(!f.matches(&sample(NotificationStatus::Pending, 0, 60)));
        assert!(f.matches(&sample(NotificationStatus::Pending, 1, 60)));
        assert!(f.matches(&sample(NotificationStatus::Pending, 300, 360)));
        assert!(!f.matches(&sample(NotificationStatus::Pending, 301, 360)));
        assert!(!f.matches(&sample(NotificationStatus::Active, 60, 120)));
    }

    #[test]
    fn open_window_filter_is_start_inclusive_end_exclusive() {
        let f = NotificationFilter::window_open(t0());
        assert!(f.matches(&sample(NotificationStatus::Pending, 0, 60)));
        assert!(f.matches(&sample(NotificationStatus::Pending, -30, 1)));
        assert!(!f.matches(&sample(NotificationStatus::Pending, -60, 0)));
        assert!(!f.matches(&sample(NotificationStatus::Pending, 1, 60)));
    }

    #[test]
    fn closed_and_missed_filters_split_by_status() {
        let closed = NotificationFilter::window_closed(t0());
        let missed = NotificationFilter::missed(t0());
        let active_done = sample(NotificationStatus::Active, -60, 0);
        let pending_done = sample(NotificationStatus::Pending, -60, -1);
        assert!(closed.matches(&active_done));
        assert!(!closed.matches(&pending_done));
        assert!(missed.matches(&pending_done));
        assert!(!missed.matches(&sample(NotificationStatus::Pending, -60, 1)));
    }

    #[test]
    fn window_open_at_matches_filter() {
        let n = sample(NotificationStatus::Pending, 0, 10);
        assert!(n.window_open_at(t0()));
        assert!(!n.window_open_at(t0() + Duration::seconds(10)));
    }
}
