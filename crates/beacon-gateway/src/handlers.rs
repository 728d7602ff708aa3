// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the device and notification API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use beacon_core::{Device, NewNotification, Notification, NotificationId};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.sessions.active_count(),
    })
}

/// GET /api/devices
///
/// Runs a discovery; an empty scan answers with the last known devices.
pub async fn get_devices(State(state): State<GatewayState>) -> Result<Json<Vec<Device>>, ApiError> {
    Ok(Json(state.directory.discover().await?))
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<GatewayState>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// GET /api/notifications/{id}
pub async fn get_notification(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let id = NotificationId::from(id);
    match state.store.get(&id).await? {
        Some(n) => Ok(Json(n)),
        None => Err(ApiError::not_found(format!("notification {id} not found"))),
    }
}

/// POST /api/notifications
///
/// Validates the request and persists a `pending` notification. The device
/// must be one the directory has seen, unless nothing has been discovered yet.
pub async fn create_notification(
    State(state): State<GatewayState>,
    Json(body): Json<NewNotification>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = body.into_notification(state.clock.now())?;

    let known = state.directory.cached();
    if !known.is_empty() && !known.iter().any(|d| d.name == notification.device) {
        return Err(ApiError::bad_request(format!(
            "unknown device `{}`",
            notification.device
        )));
    }

    state.store.insert(&notification).await?;
    info!(
        notification_id = %notification.id,
        device = %notification.device,
        start = %notification.start_time,
        end = %notification.end_time,
        "notification created"
    );
    Ok((StatusCode::CREATED, Json(notification)))
}

/// DELETE /api/notifications/{id}
///
/// A live session is torn down before the row goes away.
pub async fn delete_notification(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = NotificationId::from(id);
    if state.store.get(&id).await?.is_none() {
        return Err(ApiError::not_found(format!("notification {id} not found")));
    }

    if state.sessions.stop(&id).await? {
        info!(notification_id = %id, "stopped live session before delete");
    }
    state.store.delete(&id).await?;

    if let Err(e) = state.pipeline.artifacts().purge(&id).await {
        warn!(notification_id = %id, error = %e, "could not remove artifacts");
    }
    info!(notification_id = %id, "notification deleted");
    Ok(StatusCode::NO_CONTENT)
}
