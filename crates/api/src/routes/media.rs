//! Routes that move audio bytes rather than catalog rows.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::media;
use crate::state::AppState;

/// Media routes, merged at the `/api` root.
///
/// ```text
/// POST /download                  -> download
/// GET  /serve-audio/{filename}    -> serve_audio
/// GET  /uploads                   -> list_uploads
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download", post(media::download))
        .route("/serve-audio/{filename}", get(media::serve_audio))
        .route("/uploads", get(media::list_uploads))
}
