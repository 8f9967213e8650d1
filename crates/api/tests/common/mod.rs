#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

use krushi_api::config::{ServerConfig, StorageBackend, StorageConfig};
use krushi_api::handlers::media::download_client;
use krushi_api::router::build_app_router;
use krushi_api::state::AppState;
use krushi_storage::LocalBlobStore;

pub const BOUNDARY: &str = "krushi-test-boundary";

/// Build a test `ServerConfig` storing uploads under `uploads_dir`.
pub fn test_config(uploads_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        upload_timeout_secs: 30,
        site_title: "Krushi Radio".to_string(),
        max_file_size_mb: 5,
        download_allowed_hosts: vec!["cdn.example.com".to_string()],
        storage: StorageConfig {
            backend: StorageBackend::Local,
            uploads_dir: uploads_dir.to_path_buf(),
            public_audio_base_url: "/api/serve-audio".to_string(),
        },
    }
}

/// Build the production router over a local blob store in `dir`.
pub fn build_test_app(pool: PgPool, dir: &TempDir) -> Router {
    build_test_app_with(pool, test_config(&uploads_dir(dir)))
}

/// Build the production router from an explicit configuration.
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let uploads = LocalBlobStore::new(
        config.storage.uploads_dir.clone(),
        &config.storage.public_audio_base_url,
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        store: Arc::new(uploads.clone()),
        uploads,
        http: download_client(&config.download_allowed_hosts, Duration::from_secs(5))
            .unwrap(),
    };

    build_app_router(state, &config)
}

pub fn uploads_dir(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("uploads")
}

/// Sorted names of the files in the upload directory (empty if it is missing).
pub fn stored_files(dir: &TempDir) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(uploads_dir(dir)) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_multipart(
    app: Router,
    method: Method,
    uri: &str,
    form: &MultipartForm,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(form.body()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

/// Minimal multipart/form-data body builder.
#[derive(Default)]
pub struct MultipartForm {
    parts: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form with the four program fields filled in.
    pub fn program(name: &str, date: &str, category: &str, description: &str) -> Self {
        Self::new()
            .text("programName", name)
            .text("date", date)
            .text("category", category)
            .text("description", description)
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(data);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    pub fn body(&self) -> Vec<u8> {
        let mut body = self.parts.clone();
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}
