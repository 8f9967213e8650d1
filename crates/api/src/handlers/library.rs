//! Read-only catalog views: the filtered library and dashboard stats.

use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use krushi_core::library::{query_page, LibraryFilter, LibraryPage};
use krushi_core::program::parse_broadcast_date;
use krushi_core::stats::{catalog_stats, CatalogStats};
use krushi_core::types::BroadcastDate;
use krushi_db::models::program::Program;
use krushi_db::repositories::ProgramRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LibraryParams {
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    pub page: Option<usize>,
}

fn optional_date(value: Option<&str>) -> AppResult<Option<BroadcastDate>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(parse_broadcast_date(v)?)),
        None => Ok(None),
    }
}

impl LibraryParams {
    fn filter(&self) -> AppResult<LibraryFilter> {
        Ok(LibraryFilter {
            search: self.search.clone().unwrap_or_default(),
            start_date: optional_date(self.start_date.as_deref())?,
            end_date: optional_date(self.end_date.as_deref())?,
            category: self
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty() && *c != "all")
                .map(str::to_string),
        })
    }
}

/// GET /api/library
///
/// Query: `search`, `start_date`, `end_date`, `category`, `page` (1-based).
pub async fn get_library(
    State(state): State<AppState>,
    Query(params): Query<LibraryParams>,
) -> AppResult<Json<DataResponse<LibraryPage<Program>>>> {
    let filter = params.filter()?;
    let programs = ProgramRepo::list(&state.pool).await?;
    let page = query_page(&programs, &filter, params.page.unwrap_or(1));
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/stats
pub async fn get_stats(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<CatalogStats>>> {
    let programs = ProgramRepo::list(&state.pool).await?;
    let stats = catalog_stats(&programs, Utc::now().date_naive());
    Ok(Json(DataResponse { data: stats }))
}
