// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Beacon.
//!
//! Exposes device listing, notification CRUD, health, and the media route the
//! display devices fetch their stream from. Handlers only validate input and
//! call into the store, session manager, and content pipeline; scheduling
//! decisions stay in the scheduler.

pub mod error;
pub mod handlers;
pub mod media;
pub mod server;

pub use error::ApiError;
pub use server::{GatewayState, ServerConfig, router, start_server};
