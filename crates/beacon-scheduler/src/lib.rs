// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling scheduler for Beacon notifications.
//!
//! Status is the only source of truth: every tick re-reads persisted rows and
//! compares their timestamps against one clock reading, so a restarted
//! process picks up exactly where the last one stopped.

pub mod scheduler;

pub use scheduler::{Scheduler, SchedulerSettings, TickReport};
