use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempdir::TempDir;
use tower::ServiceExt;

use drop_server::api;
use drop_server::state::AppState;

const BOUNDARY: &str = "test-boundary";

async fn test_app() -> (Router, AppState, TempDir) {
    let temp_dir = TempDir::new("drop-server").expect("Failed to create temporary directory");
    let state = AppState::init(temp_dir.path())
        .await
        .expect("Failed to initialize state");
    (api::router(state.clone()), state, temp_dir)
}

/// Build a `multipart/form-data` body carrying the given files under the
/// `files` field.
fn multipart_body(files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (filename, mime, content) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{filename}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(app: &Router, files: &[(&str, &str, &[u8])]) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_upload_creates_records_and_blobs() {
    let (app, state, _temp_dir) = test_app().await;

    let (status, json) = upload(
        &app,
        &[
            ("report.pdf", "application/pdf", b"pdf bytes"),
            ("notes.txt", "text/plain", b"some notes"),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let files = json["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_ne!(files[0]["id"], files[1]["id"]);
    assert_eq!(files[0]["originalFilename"], "report.pdf");
    assert_eq!(files[0]["size"], 9);
    assert_eq!(files[0]["mimeType"], "application/pdf");

    for file in files {
        let stored = file["storedFilename"].as_str().unwrap();
        assert!(state.blobs.contains(stored).await);
    }
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let (app, _state, _temp_dir) = test_app().await;

    let (status, json) = upload(&app, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("no files"));
}

#[tokio::test]
async fn test_list_includes_uploaded_records_once() {
    let (app, _state, _temp_dir) = test_app().await;

    let (_, uploaded) = upload(
        &app,
        &[
            ("a.txt", "text/plain", b"a"),
            ("b.txt", "text/plain", b"b"),
        ],
    )
    .await;

    let (status, listed) = get_json(&app, "/files").await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);

    for file in uploaded["files"].as_array().unwrap() {
        let occurrences = listed
            .iter()
            .filter(|entry| entry["id"] == file["id"])
            .count();
        assert_eq!(occurrences, 1);
    }
}

#[tokio::test]
async fn test_download_round_trip() {
    let (app, _state, _temp_dir) = test_app().await;

    let content = b"%PDF-1.4 not really a pdf";
    let (_, uploaded) = upload(&app, &[("report.pdf", "application/pdf", content)]).await;
    let id = uploaded["files"][0]["id"].as_str().unwrap();

    let request = Request::builder()
        .uri(format!("/download/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        content.len().to_string().as_str()
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("report.pdf"));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], content);
}

#[tokio::test]
async fn test_download_unknown_id_is_not_found() {
    let (app, _state, _temp_dir) = test_app().await;

    let (status, json) = get_json(&app, "/download/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_download_missing_blob_self_heals() {
    let (app, state, _temp_dir) = test_app().await;

    let (_, uploaded) = upload(&app, &[("gone.txt", "text/plain", b"bye")]).await;
    let id = uploaded["files"][0]["id"].as_str().unwrap();
    let stored = uploaded["files"][0]["storedFilename"].as_str().unwrap();

    // Remove the blob out from under the registry.
    tokio::fs::remove_file(state.blobs.path_of(stored))
        .await
        .unwrap();

    let (status, _) = get_json(&app, &format!("/download/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The repair removed the record as well.
    let (_, listed) = get_json(&app, "/files").await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_removes_record_and_blob() {
    let (app, state, _temp_dir) = test_app().await;

    let (_, uploaded) = upload(&app, &[("a.txt", "text/plain", b"a")]).await;
    let id = uploaded["files"][0]["id"].as_str().unwrap();
    let stored = uploaded["files"][0]["storedFilename"]
        .as_str()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/files/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!state.blobs.contains(&stored).await);
    let (_, listed) = get_json(&app, "/files").await;
    assert!(listed.as_array().unwrap().is_empty());

    // Second delete of the same id: the record is gone.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/files/{id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_restart_reloads_live_records() {
    let temp_dir = TempDir::new("drop-server").unwrap();

    let state = AppState::init(temp_dir.path()).await.unwrap();
    let app = api::router(state);
    let (_, uploaded) = upload(
        &app,
        &[
            ("a.txt", "text/plain", b"a"),
            ("b.txt", "text/plain", b"b"),
        ],
    )
    .await;
    drop(app);

    // A fresh process over the same data directory sees the same records.
    let state = AppState::init(temp_dir.path()).await.unwrap();
    let app = api::router(state);
    let (status, listed) = get_json(&app, "/files").await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    for file in uploaded["files"].as_array().unwrap() {
        assert!(listed.iter().any(|entry| entry["id"] == file["id"]));
    }
}

#[tokio::test]
async fn test_malformed_snapshot_starts_empty() {
    let temp_dir = TempDir::new("drop-server").unwrap();
    tokio::fs::write(temp_dir.path().join("registry.json"), "{broken")
        .await
        .unwrap();

    let state = AppState::init(temp_dir.path()).await.unwrap();
    let app = api::router(state);
    let (status, listed) = get_json(&app, "/files").await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_route_keeps_error_shape() {
    let (app, _state, _temp_dir) = test_app().await;

    let (status, json) = get_json(&app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}
