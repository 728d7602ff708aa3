// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of [`BeaconError`] onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use beacon_core::BeaconError;
use serde::Serialize;
use tracing::warn;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error returned from a handler.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<BeaconError> for ApiError {
    fn from(err: BeaconError) -> Self {
        let status = match &err {
            BeaconError::Validation(_) => StatusCode::BAD_REQUEST,
            BeaconError::NotFound(_) => StatusCode::NOT_FOUND,
            BeaconError::SessionExists(_) => StatusCode::CONFLICT,
            BeaconError::Cast { .. } => StatusCode::BAD_GATEWAY,
            BeaconError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BeaconError::Media { .. } | BeaconError::Narration { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            BeaconError::Config(_) | BeaconError::Storage { .. } | BeaconError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            warn!(error = %err, status = status.as_u16(), "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
