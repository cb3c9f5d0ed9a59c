//! Playlist channel import endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::errors::{ImportError, ReadError, StoreError};
use crate::AppState;

type ApiError = (StatusCode, Json<Value>);

/// Query params for import operations
#[derive(Debug, Deserialize)]
pub struct PlaylistQuery {
    /// Playlist file; defaults to `PLAYLIST_PATH`
    pub path: Option<String>,
}

/// Map an import failure to an HTTP response
fn import_error_response(err: &ImportError) -> ApiError {
    let status = match err {
        ImportError::Read(ReadError::NotFound { .. }) => StatusCode::NOT_FOUND,
        ImportError::Read(ReadError::Decode { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        ImportError::Read(ReadError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        ImportError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ImportError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

fn resolve_path(state: &AppState, query: PlaylistQuery) -> Result<String, ApiError> {
    query
        .path
        .filter(|p| !p.trim().is_empty())
        .or_else(|| state.config.playlist_path.clone())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "No playlist path given and PLAYLIST_PATH is not set"
                })),
            )
        })
}

/// POST /api/channels/import - Import channels from a playlist file
pub async fn import_channels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaylistQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let path = resolve_path(&state, query)?;

    let report = state.importer.import(&path).await.map_err(|e| {
        tracing::error!("Channel import from {} failed: {}", path, e);
        import_error_response(&e)
    })?;

    Ok(Json(report))
}

/// POST /api/channels/logos - Refresh logos of stored channels
pub async fn refresh_logos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlaylistQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let path = resolve_path(&state, query)?;

    let report = state.importer.refresh_logos(&path).await.map_err(|e| {
        tracing::error!("Logo refresh from {} failed: {}", path, e);
        import_error_response(&e)
    })?;

    Ok(Json(report))
}
