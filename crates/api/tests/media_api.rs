//! Integration tests for download proxying and local upload serving.

mod common;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use common::{body_bytes, body_json, get, post_json, uploads_dir};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn write_upload(dir: &tempfile::TempDir, name: &str, data: &[u8]) {
    std::fs::create_dir_all(uploads_dir(dir)).unwrap();
    std::fs::write(uploads_dir(dir).join(name), data).unwrap();
}

// ---------------------------------------------------------------------------
// Serve audio
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn serve_audio_streams_file(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    write_upload(&dir, "1-show.mp3", b"0123456789");

    let response = get(common::build_test_app(pool, &dir), "/api/serve-audio/1-show.mp3").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(response.headers()[header::ACCEPT_RANGES], "bytes");
    assert_eq!(body_bytes(response).await, b"0123456789");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn serve_audio_honours_range(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    write_upload(&dir, "1-show.ogg", b"0123456789");

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/serve-audio/1-show.ogg")
        .header(header::RANGE, "bytes=2-5")
        .body(Body::empty())
        .unwrap();
    let response = common::build_test_app(pool.clone(), &dir)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/ogg");
    assert_eq!(body_bytes(response).await, b"2345");

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/serve-audio/1-show.ogg")
        .header(header::RANGE, "bytes=50-")
        .body(Body::empty())
        .unwrap();
    let response = common::build_test_app(pool, &dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn serve_audio_missing_file_is_404(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let response = get(common::build_test_app(pool, &dir), "/api/serve-audio/nope.mp3").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "File not found");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn serve_audio_rejects_traversal(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

    let response = get(
        common::build_test_app(pool, &dir),
        "/api/serve-audio/..%2Fsecret.txt",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Upload listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn uploads_lists_files_sorted(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let response = get(common::build_test_app(pool.clone(), &dir), "/api/uploads").await;
    assert_eq!(body_json(response).await, json!({ "files": [] }));

    write_upload(&dir, "2-b.mp3", b"b");
    write_upload(&dir, "1-a.mp3", b"a");
    let response = get(common::build_test_app(pool, &dir), "/api/uploads").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "files": ["1-a.mp3", "2-b.mp3"] })
    );
}

// ---------------------------------------------------------------------------
// Download proxy
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn download_reads_stored_blob_as_attachment(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    write_upload(&dir, "1-show.mp3", b"ID3data");

    let response = post_json(
        common::build_test_app(pool, &dir),
        "/api/download",
        json!({ "url": "/api/serve-audio/1-show.mp3", "fileName": "Morning Show.mp3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Morning Show.mp3\""
    );
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "7");
    assert_eq!(body_bytes(response).await, b"ID3data");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_without_file_name_uses_default(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    write_upload(&dir, "1-show.mp3", b"ID3");

    let response = post_json(
        common::build_test_app(pool, &dir),
        "/api/download",
        json!({ "url": "/api/serve-audio/1-show.mp3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"audio.mp3\""
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_of_missing_blob_is_404(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let response = post_json(
        common::build_test_app(pool, &dir),
        "/api/download",
        json!({ "url": "/api/serve-audio/gone.mp3", "fileName": "gone.mp3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_from_unlisted_host_is_rejected(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    for url in [
        "http://169.254.169.254/latest/meta-data",
        "https://evil.example.org/a.mp3",
        "file:///etc/passwd",
        "not a url",
    ] {
        let response = post_json(
            common::build_test_app(pool.clone(), &dir),
            "/api/download",
            json!({ "url": url, "fileName": "a.mp3" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "url: {url}");
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_requires_url(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let response = post_json(
        common::build_test_app(pool, &dir),
        "/api/download",
        json!({ "url": "  " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Serve `router` on an ephemeral local port.
async fn spawn_server(router: axum::Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[sqlx::test(migrations = "../db/migrations")]
async fn download_does_not_follow_redirects_off_the_allowlist(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();

    let secret = axum::routing::get(|| async { "INTERNAL-SECRET" });
    let internal = spawn_server(axum::Router::new().route("/secret", secret)).await;

    let target = format!("http://localhost:{}/secret", internal.port());
    let bounce = axum::routing::get(move || {
        let target = target.clone();
        async move { axum::response::Redirect::temporary(&target) }
    });
    let public = axum::routing::get(|| async { "ID3public" });
    let cdn = spawn_server(
        axum::Router::new()
            .route("/a.mp3", bounce)
            .route("/b.mp3", public),
    )
    .await;

    let mut config = common::test_config(&uploads_dir(&dir));
    config.download_allowed_hosts = vec!["127.0.0.1".to_string()];

    let response = post_json(
        common::build_test_app_with(pool.clone(), config.clone()),
        "/api/download",
        json!({ "url": format!("http://127.0.0.1:{}/a.mp3", cdn.port()), "fileName": "a.mp3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Failed to download file");

    let response = post_json(
        common::build_test_app_with(pool, config),
        "/api/download",
        json!({ "url": format!("http://127.0.0.1:{}/b.mp3", cdn.port()), "fileName": "b.mp3" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"ID3public");
}
