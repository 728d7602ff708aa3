// SPDX-FileCopyrightText: 2026 Beacon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serves generated HLS artifacts to display devices.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use beacon_core::{MANIFEST_NAME, NotificationId};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::server::GatewayState;

const PLAYLIST_CONTENT_TYPE: &str = "application/x-mpegurl";
const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";
const SEGMENT_CACHE_CONTROL: &str = "public, max-age=3600";
const CARD_CONTENT_TYPE: &str = "image/png";

/// Content type and cache policy for a served file, by extension.
fn file_kind(file: &str) -> Option<(&'static str, &'static str)> {
    if file.ends_with(".m3u8") {
        Some((PLAYLIST_CONTENT_TYPE, "no-cache"))
    } else if file.ends_with(".ts") {
        Some((SEGMENT_CONTENT_TYPE, SEGMENT_CACHE_CONTROL))
    } else {
        None
    }
}

/// GET /media/{id}/{file}
///
/// A missing manifest for a known notification is generated on the spot,
/// through the same deduplicator the scheduler uses.
pub async fn get_media(
    State(state): State<GatewayState>,
    Path((id, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let (content_type, cache_control) =
        file_kind(&file).ok_or_else(|| ApiError::not_found(format!("no such media file {file}")))?;
    let path = state
        .pipeline
        .artifacts()
        .chunk_file(&id, &file)
        .ok_or_else(|| ApiError::bad_request("invalid media path"))?;

    let notification_id = NotificationId::from(id);
    if file == MANIFEST_NAME && !state.pipeline.is_ready(&notification_id).await {
        let Some(n) = state.store.get(&notification_id).await? else {
            return Err(ApiError::not_found(format!(
                "notification {notification_id} not found"
            )));
        };
        info!(notification_id = %n.id, "manifest requested before pre-generation, generating now");
        state.pipeline.ensure_ready(&n).await?;
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::not_found(format!("no such media file {file}")));
        }
        Err(e) => {
            return Err(ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("cannot read {file}: {e}"),
            ));
        }
    };
    debug!(notification_id = %notification_id, file = %file, bytes = bytes.len(), "serving media");

    Ok(file_response(bytes, content_type, cache_control))
}

/// GET /api/notifications/{id}/image
///
/// Preview of the card shown on the device. Rendered on demand when the
/// pipeline has not produced it yet.
pub async fn get_card_image(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = NotificationId::from(id);
    let Some(n) = state.store.get(&id).await? else {
        return Err(ApiError::not_found(format!("notification {id} not found")));
    };

    let path = state.pipeline.ensure_card(&n).await?;
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("cannot read card for {id}: {e}"),
        )
    })?;
    Ok(file_response(bytes, CARD_CONTENT_TYPE, "no-cache"))
}

fn file_response(bytes: Vec<u8>, content_type: &'static str, cache_control: &'static str) -> Response {
    let mut response = Response::new(Body::from(bytes));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlists_are_never_cached() {
        assert_eq!(file_kind("playlist.m3u8"), Some(("application/x-mpegurl", "no-cache")));
        assert_eq!(file_kind("index.m3u8"), Some(("application/x-mpegurl", "no-cache")));
    }

    #[test]
    fn segments_are_cacheable() {
        let (ty, cache) = file_kind("3.ts").unwrap();
        assert_eq!(ty, "video/mp2t");
        assert!(cache.contains("max-age"));
    }

    #[test]
    fn other_files_are_not_served() {
        assert_eq!(file_kind("n.png"), None);
        assert_eq!(file_kind("passwd"), None);
    }
}
