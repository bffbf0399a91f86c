mod download;
mod list;
mod remove;
mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::error::ApiError;
use crate::state::AppState;

/// The four-endpoint HTTP surface driving the registry and the blob store.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload::upload))
        .route("/files", get(list::list))
        .route("/files/:id", delete(remove::remove))
        .route("/download/:id", get(download::download))
        // Quota enforcement is out of scope; let uploads be as large as
        // the disk allows.
        .layer(DefaultBodyLimit::disable())
        .fallback(fallback)
        .with_state(state)
}

/// Keep the `{"error"}` body shape uniform on unknown routes.
async fn fallback() -> ApiError {
    ApiError::NotFound("route".to_string())
}
