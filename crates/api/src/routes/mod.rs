pub mod audio;
pub mod health;
pub mod library;
pub mod media;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree, apart from `/audio`.
///
/// `/audio` (see [`audio::router`]) is nested separately by the app router
/// so it can run under the longer upload timeout.
///
/// Route hierarchy:
///
/// ```text
/// /library                      filtered, paginated library view
/// /stats                        catalog statistics
///
/// /download                     download proxy (POST)
/// /serve-audio/{filename}       stream a local upload
/// /uploads                      list local uploads
///
/// /settings                     site settings (read-only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(library::router())
        .merge(media::router())
        .route("/settings", get(handlers::settings::get_settings))
}
