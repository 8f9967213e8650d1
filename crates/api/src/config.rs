use std::path::PathBuf;

/// Where uploaded audio is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Files in `uploads_dir`, served by `/api/serve-audio/{filename}`.
    Local,
    /// Objects in an S3 bucket.
    S3 { bucket: String, public_base_url: Option<String> },
}

/// Blob storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Local upload directory (default: `public/uploads`).
    pub uploads_dir: PathBuf,
    /// URL prefix for locally stored audio (default: `/api/serve-audio`).
    pub public_audio_base_url: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Timeout for `/api/audio` requests, which carry uploads (default: `600`).
    pub upload_timeout_secs: u64,
    /// Site title reported by `/api/settings` (default: `Krushi Radio`).
    pub site_title: String,
    /// Largest accepted upload in megabytes (default: `300`).
    pub max_file_size_mb: u64,
    /// Hosts the download proxy may fetch from besides the blob store.
    pub download_allowed_hosts: Vec<String>,
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `3000`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                       |
    /// | `UPLOAD_TIMEOUT_SECS`    | `600`                      |
    /// | `SITE_TITLE`             | `Krushi Radio`             |
    /// | `MAX_FILE_SIZE`          | `300` (MB)                 |
    /// | `DOWNLOAD_ALLOWED_HOSTS` | empty                      |
    /// | `STORAGE_BACKEND`        | `local` (`local` or `s3`)  |
    /// | `UPLOADS_DIR`            | `public/uploads`           |
    /// | `PUBLIC_AUDIO_BASE_URL`  | `/api/serve-audio`         |
    /// | `S3_BUCKET`              | required when `s3`         |
    /// | `S3_PUBLIC_BASE_URL`     | bucket URL                 |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = env_list("CORS_ORIGINS", "http://localhost:3000");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_timeout_secs: u64 = std::env::var("UPLOAD_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("UPLOAD_TIMEOUT_SECS must be a valid u64");

        let site_title = std::env::var("SITE_TITLE").unwrap_or_else(|_| "Krushi Radio".into());

        let max_file_size_mb: u64 = std::env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("MAX_FILE_SIZE must be a number of megabytes");

        let download_allowed_hosts = env_list("DOWNLOAD_ALLOWED_HOSTS", "");

        let backend = match std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".into())
            .as_str()
        {
            "local" => StorageBackend::Local,
            "s3" => StorageBackend::S3 {
                bucket: std::env::var("S3_BUCKET")
                    .expect("S3_BUCKET must be set when STORAGE_BACKEND=s3"),
                public_base_url: std::env::var("S3_PUBLIC_BASE_URL").ok(),
            },
            other => panic!("Unknown STORAGE_BACKEND '{other}'. Must be one of: local, s3"),
        };

        let storage = StorageConfig {
            backend,
            uploads_dir: std::env::var("UPLOADS_DIR")
                .unwrap_or_else(|_| "public/uploads".into())
                .into(),
            public_audio_base_url: std::env::var("PUBLIC_AUDIO_BASE_URL")
                .unwrap_or_else(|_| "/api/serve-audio".into()),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_timeout_secs,
            site_title,
            max_file_size_mb,
            download_allowed_hosts,
            storage,
        }
    }

    /// Upload body limit in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_file_size_mb as usize).saturating_mul(1024 * 1024)
    }
}

/// Read a comma-separated list, dropping blanks.
fn env_list(key: &str, default: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_else(|_| default.into())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
