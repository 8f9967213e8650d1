use std::sync::Arc;

use krushi_storage::{BlobStore, LocalBlobStore};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: krushi_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Where uploaded audio goes (local directory or S3).
    pub store: Arc<dyn BlobStore>,
    /// The local upload directory behind `/api/serve-audio` and `/api/uploads`.
    pub uploads: LocalBlobStore,
    /// Client for the download proxy.
    pub http: reqwest::Client,
}
