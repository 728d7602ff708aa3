// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    routing::get,
};
use beacon_cast::SessionManager;
use beacon_core::{BeaconError, Clock, DeviceDirectory, NotificationStore};
use beacon_media::ContentPipeline;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::media;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<dyn NotificationStore>,
    pub directory: Arc<dyn DeviceDirectory>,
    pub sessions: Arc<SessionManager>,
    pub pipeline: Arc<ContentPipeline>,
    pub clock: Arc<dyn Clock>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

/// Gateway server configuration (mirrors `GatewayConfig` from beacon-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the router with every route and layer attached.
///
/// - GET /health
/// - GET /api/devices
/// - GET, POST /api/notifications
/// - GET, DELETE /api/notifications/{id}
/// - GET /api/notifications/{id}/image
/// - GET /media/{id}/{file}
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/devices", get(handlers::get_devices))
        .route(
            "/api/notifications",
            get(handlers::list_notifications).post(handlers::create_notification),
        )
        .route(
            "/api/notifications/{id}",
            get(handlers::get_notification).delete(handlers::delete_notification),
        )
        .route("/api/notifications/{id}/image", get(media::get_card_image))
        .route("/media/{id}/{file}", get(media::get_media))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the gateway HTTP server and serve until `shutdown` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), BeaconError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BeaconError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| BeaconError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
    }
}
