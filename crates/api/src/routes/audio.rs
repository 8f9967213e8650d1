//! Route definitions for the `/audio` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::audio;
use crate::state::AppState;

/// Routes mounted at `/api/audio`.
///
/// ```text
/// GET    /        -> list_programs
/// POST   /        -> create_program (multipart)
/// PUT    /        -> update_program (multipart, `id` field)
/// DELETE /?id=N   -> delete_program
/// GET    /{id}    -> get_program
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(audio::list_programs)
                .post(audio::create_program)
                .put(audio::update_program)
                .delete(audio::delete_program),
        )
        .route("/{id}", get(audio::get_program))
}
