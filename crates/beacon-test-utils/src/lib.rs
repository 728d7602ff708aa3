// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Beacon integration tests.
//!
//! Provides mock collaborators and a harness that wires them to a real
//! SQLite store, artifact store, content pipeline, and session manager, so
//! scheduler and API tests run without devices, ffmpeg, or a TTS service.
//!
//! # Components
//!
//! - [`ManualClock`] - Clock the test moves by hand
//! - [`MemoryStore`] - In-memory store with fault injection and a transition log
//! - [`MockDirectory`] / [`MockTransport`] - Device side of a cast session
//! - [`MockRenderer`] / [`MockNarrator`] / [`MockEncoder`] - Media providers
//! - [`TestHarness`] - Everything above assembled

pub mod clock;
pub mod harness;
pub mod mock_devices;
pub mod mock_media;
pub mod mock_store;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_devices::{MockDirectory, MockTransport, StartedSession};
pub use mock_media::{MockEncoder, MockNarrator, MockRenderer};
pub use mock_store::MemoryStore;
