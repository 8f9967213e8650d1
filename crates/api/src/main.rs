use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use krushi_storage::{BlobStore, LocalBlobStore, S3BlobStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use krushi_api::config::{ServerConfig, StorageBackend};
use krushi_api::handlers::media::download_client;
use krushi_api::router::build_app_router;
use krushi_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "krushi_api=debug,krushi_storage=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = krushi_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    krushi_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    krushi_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Blob storage ---
    let uploads = LocalBlobStore::new(
        config.storage.uploads_dir.clone(),
        &config.storage.public_audio_base_url,
    );
    let store: Arc<dyn BlobStore> = match &config.storage.backend {
        StorageBackend::Local => Arc::new(uploads.clone()),
        StorageBackend::S3 {
            bucket,
            public_base_url,
        } => Arc::new(S3BlobStore::from_env(bucket, public_base_url.as_deref()).await),
    };
    tracing::info!(
        backend = store.backend_name(),
        uploads_dir = %config.storage.uploads_dir.display(),
        "Blob store ready",
    );

    // --- Download proxy client ---
    let http = download_client(
        &config.download_allowed_hosts,
        Duration::from_secs(config.request_timeout_secs),
    )
    .expect("Failed to build HTTP client");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        store,
        uploads,
        http,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
