use axum::routing::get;
use axum::Router;

use crate::handlers::library;
use crate::state::AppState;

/// Library and stats routes, merged at the `/api` root.
///
/// ```text
/// GET /library   -> get_library
/// GET /stats     -> get_stats
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/library", get(library::get_library))
        .route("/stats", get(library::get_stats))
}
