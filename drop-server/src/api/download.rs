use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use drop_error::DropError;
use tokio_util::io::ReaderStream;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /download/{id}`: stream a blob back to the client.
///
/// A record whose backing blob has vanished is removed before answering
/// 404, so the registry heals itself on the next access. A stream failure
/// after the headers went out just terminates the connection.
pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let registry = state.registry.lock().await;
    let record = registry
        .get(&id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("file {id}")))?;
    drop(registry);

    let file = match state.blobs.get(&record.stored_filename).await {
        Ok(file) => file,
        Err(DropError::NotFound(_)) => {
            let mut registry = state.registry.lock().await;
            if let Err(err) = registry.reconcile_missing(&id) {
                log::error!("failed to persist registry after reconciling {id}: {err}");
            }
            return Err(ApiError::NotFound(format!("file {id}")));
        }
        Err(err) => return Err(err.into()),
    };

    let disposition = format!(
        "attachment; filename=\"{}\"",
        urlencoding::encode(&record.original_filename)
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.mime_type.as_str())
        .header(header::CONTENT_DISPOSITION, disposition)
        .header(header::CONTENT_LENGTH, record.size)
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| ApiError::Internal(format!("failed to build response: {err}")))?;

    log::info!("download {} ({} bytes)", record.id, record.size);
    Ok(response)
}
