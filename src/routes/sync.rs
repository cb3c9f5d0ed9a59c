//! Catalog sync triggers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::{StoreError, SyncError};
use crate::models::SyncOutcome;
use crate::AppState;

/// Upper bound on a sync holding the cross-replica lock (seconds)
const SYNC_LOCK_TTL_SECS: u64 = 2 * 60 * 60;

type ApiError = (StatusCode, Json<Value>);

/// Map a sync failure to an HTTP response
pub(crate) fn sync_error_response(err: &SyncError) -> ApiError {
    let status = match err {
        SyncError::Remote(_) => StatusCode::BAD_GATEWAY,
        SyncError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        SyncError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// Run `sync` under the Redis lock when one is configured
///
/// Without Redis, or when Redis cannot be reached, only the in-process
/// mutual exclusion of the synchronizer applies.
async fn with_sync_lock<F, Fut>(state: &AppState, sync: F) -> Result<SyncOutcome, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<SyncOutcome, SyncError>>,
{
    let Some(redis) = &state.redis else {
        return sync().await.map_err(|e| sync_error_response(&e));
    };

    let job_id = Uuid::new_v4().to_string();
    let locked = match redis.acquire_sync_lock(&job_id, SYNC_LOCK_TTL_SECS).await {
        Ok(true) => true,
        Ok(false) => {
            return Err((
                StatusCode::CONFLICT,
                Json(serde_json::json!({ "error": "A catalog sync is already running" })),
            ));
        }
        Err(e) => {
            tracing::warn!("Redis lock unavailable, syncing without it: {}", e);
            false
        }
    };

    let result = sync().await;

    if locked {
        if let Err(e) = redis.release_sync_lock(&job_id).await {
            tracing::warn!("Failed to release sync lock {}: {}", job_id, e);
        }
    }

    result.map_err(|e| sync_error_response(&e))
}

/// POST /api/sync - Sync if the catalog is stale
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let synchronizer = Arc::clone(&state.synchronizer);
    let outcome = with_sync_lock(&state, || async move { synchronizer.sync_if_stale().await }).await?;
    Ok(Json(outcome))
}

/// POST /api/sync/force - Sync regardless of the cache
pub async fn force_sync(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let synchronizer = Arc::clone(&state.synchronizer);
    let outcome = with_sync_lock(&state, || async move { synchronizer.force_sync().await }).await?;
    Ok(Json(outcome))
}
