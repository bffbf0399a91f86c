use axum::extract::{Path, State};
use axum::Json;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `DELETE /files/{id}`: drop the blob, then the record.
///
/// The blob delete is best-effort idempotent; a blob that is already gone
/// does not fail the request.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut registry = state.registry.lock().await;
    let record = registry
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("file {id}")))?;

    // Blob first, registry second: a record must never outlive a delete
    // acknowledgement, while an orphaned blob is only wasted space.
    state.blobs.delete(&record.stored_filename).await?;
    registry.remove(&id)?;
    drop(registry);

    log::info!("deleted {} ({})", record.id, record.original_filename);
    Ok(Json(serde_json::json!({
        "message": format!("deleted {}", record.original_filename)
    })))
}
