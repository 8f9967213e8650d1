use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Public site settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub site_title: String,
    /// Largest accepted upload, in megabytes.
    pub max_file_size: u64,
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SiteSettings> {
    Json(SiteSettings {
        site_title: state.config.site_title.clone(),
        max_file_size: state.config.max_file_size_mb,
    })
}
