use axum::extract::State;
use axum::Json;
use fs_registry::FileRecord;

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /files`: all live records, newest first.
///
/// Blob presence is not verified here; a stale record survives until the
/// download path observes its blob missing.
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<FileRecord>>> {
    let registry = state.registry.lock().await;
    let mut records = registry.records();
    drop(registry);

    // The registry guarantees no order; newest-first is presentation.
    records.sort_by(|a, b| b.upload_time.cmp(&a.upload_time));

    Ok(Json(records))
}
