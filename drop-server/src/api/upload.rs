use axum::extract::{Multipart, State};
use axum::Json;
use fs_blob::BlobStore;
use fs_registry::FileRecord;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub files: Vec<FileRecord>,
}

/// `POST /upload`: accept 1..N files from the `files` multipart field.
///
/// Files are processed independently. When one fails partway through, the
/// ones already written stay live — partial success, no rollback.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let mut uploaded = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        log::warn!("failed to read multipart field: {err}");
        ApiError::BadRequest(format!("invalid multipart data: {err}"))
    })? {
        if field.name() != Some("files") {
            continue;
        }

        let original_filename = field
            .file_name()
            .map(ToString::to_string)
            .unwrap_or_else(|| "upload.bin".to_string());
        let mime_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_else(|| "application/octet-stream".to_string());

        // Fully drained before anything is registered; a truncated body
        // never produces a record.
        let content = field.bytes().await.map_err(|err| {
            log::warn!("failed to read data for {original_filename}: {err}");
            ApiError::BadRequest(format!("failed to read file data: {err}"))
        })?;

        let id = Uuid::new_v4().to_string();
        let stored_name = BlobStore::stored_name(&id, &original_filename);

        state.blobs.put(&stored_name, &content).await.map_err(|err| {
            log::error!("blob write failed for {original_filename}: {err}");
            ApiError::Internal(format!("failed to store file: {err}"))
        })?;

        let record = FileRecord::new(
            id,
            original_filename,
            stored_name,
            content.len() as u64,
            mime_type,
        );

        let mut registry = state.registry.lock().await;
        if let Err(err) = registry.insert(record.clone()) {
            // The in-memory entry stays live; the snapshot catches up on
            // the next successful mutation.
            log::error!("registry persist failed after storing {}: {err}", record.id);
            return Err(ApiError::Internal(format!(
                "failed to persist registry: {err}"
            )));
        }
        drop(registry);

        log::info!(
            "uploaded {} as {} ({} bytes)",
            record.original_filename,
            record.id,
            record.size
        );
        uploaded.push(record);
    }

    if uploaded.is_empty() {
        return Err(ApiError::BadRequest("no files attached".to_string()));
    }

    Ok(Json(UploadResponse {
        message: format!("uploaded {} file(s)", uploaded.len()),
        files: uploaded,
    }))
}
