//! Download proxy and local upload serving.

use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{self, HeaderMap};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use bytes::Bytes;
use krushi_core::program::{attachment_disposition, content_type_for_file_name};
use krushi_storage::{BlobStore, StorageError};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadList {
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a `Range: bytes=start-[end]` header value.
fn parse_range_header(range: &str) -> Option<(u64, Option<u64>)> {
    let (start, end) = range.strip_prefix("bytes=")?.split_once('-')?;
    let start = start.parse::<u64>().ok()?;
    let end = if end.is_empty() {
        None
    } else {
        Some(end.parse::<u64>().ok()?)
    };
    Some((start, end))
}

/// Whether the proxy may fetch from `host`.
fn host_allowed(allowed: &[String], host: &str) -> bool {
    allowed.iter().any(|h| h.eq_ignore_ascii_case(host))
}

/// Most redirects the download proxy follows for one request.
const MAX_DOWNLOAD_REDIRECTS: usize = 10;

/// Build the client the download proxy fetches with.
///
/// Every redirect hop must land on an allowed host, so an allowed host
/// cannot bounce the proxy somewhere else.
pub fn download_client(
    allowed_hosts: &[String],
    timeout: Duration,
) -> reqwest::Result<reqwest::Client> {
    let allowed = allowed_hosts.to_vec();
    let policy = Policy::custom(move |attempt| {
        let host = attempt.url().host_str().unwrap_or("").to_string();
        if attempt.previous().len() >= MAX_DOWNLOAD_REDIRECTS {
            attempt.error("too many redirects")
        } else if !host_allowed(&allowed, &host) {
            attempt.error(format!("redirect to '{host}' is not allowed"))
        } else {
            attempt.follow()
        }
    });

    reqwest::Client::builder()
        .redirect(policy)
        .timeout(timeout)
        .build()
}

fn storage_read_error(err: StorageError) -> AppError {
    match err {
        StorageError::NotFound(_) | StorageError::InvalidName(_) => AppError::Storage(err),
        other => AppError::DownloadFailed(other.to_string()),
    }
}

/// Fetch the bytes behind a download URL.
///
/// URLs handed out by the blob store (or the local upload directory) are
/// read back directly. Anything else must be an http(s) URL on an allowed
/// host.
async fn fetch_download(state: &AppState, url: &str) -> AppResult<Bytes> {
    if let Some(file_name) = state.store.file_name_for_url(url) {
        return state.store.get(&file_name).await.map_err(storage_read_error);
    }
    if let Some(file_name) = state.uploads.file_name_for_url(url) {
        return state.uploads.get(&file_name).await.map_err(storage_read_error);
    }

    let parsed = reqwest::Url::parse(url)
        .map_err(|_| AppError::BadRequest(format!("Invalid download URL '{url}'")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::BadRequest(format!(
            "Unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }
    let host = parsed.host_str().unwrap_or("");
    if !host_allowed(&state.config.download_allowed_hosts, host) {
        return Err(AppError::BadRequest(format!(
            "Downloads from '{host}' are not allowed"
        )));
    }

    let response = state
        .http
        .get(parsed)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| AppError::DownloadFailed(e.to_string()))?;
    response
        .bytes()
        .await
        .map_err(|e| AppError::DownloadFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/download
///
/// Body: `{"url": "...", "fileName": "..."}`. Responds with the file as an
/// attachment so the browser saves it instead of playing it.
pub async fn download(
    State(state): State<AppState>,
    Json(input): Json<DownloadRequest>,
) -> AppResult<Response> {
    let url = input.url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("Missing required field 'url'".into()));
    }

    let data = fetch_download(&state, url).await?;
    let name = input.file_name.as_deref();
    let content_type = content_type_for_file_name(name.unwrap_or(url));

    tracing::info!(url, size = data.len(), "Download proxied");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, attachment_disposition(name))
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .body(Body::from(data))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// GET /api/serve-audio/{filename}
///
/// Streams a file from the local upload directory with HTTP range support
/// so players can seek.
pub async fn serve_audio(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let path = state.uploads.path_for(&filename)?;

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(AppError::NotFound("File not found".into())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("File not found".into()))
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };
    let file_size = metadata.len();
    let content_type = content_type_for_file_name(&filename);

    let mut file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    if let Some(range_value) = headers.get(header::RANGE) {
        let range_str = range_value
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Range header".into()))?;

        if let Some((start, end)) = parse_range_header(range_str) {
            if file_size == 0 || start >= file_size || end.is_some_and(|e| e < start) {
                return Response::builder()
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
                    .body(Body::empty())
                    .map_err(|e| AppError::InternalError(e.to_string()));
            }
            let end = end.map_or(file_size - 1, |e| e.min(file_size - 1));
            let length = end - start + 1;

            file.seek(std::io::SeekFrom::Start(start))
                .await
                .map_err(|e| AppError::InternalError(e.to_string()))?;
            let stream = ReaderStream::new(file.take(length));

            return Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {start}-{end}/{file_size}"),
                )
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::from_stream(stream))
                .map_err(|e| AppError::InternalError(e.to_string()));
        }
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file_size.to_string())
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// GET /api/uploads
///
/// Names of the files in the local upload directory.
pub async fn list_uploads(State(state): State<AppState>) -> AppResult<Json<UploadList>> {
    let files = state.uploads.list().await?;
    Ok(Json(UploadList { files }))
}
