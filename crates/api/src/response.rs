//! Shared response types for API handlers.
//!
//! Newer endpoints use a `{ "data": ... }` envelope via [`DataResponse`].
//! The `/api/audio` family keeps the bare shapes existing clients read.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "message": ..., "id": ... }` returned by audio mutations.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<krushi_core::types::DbId>,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message, id: None }
    }

    pub fn with_id(message: &'static str, id: krushi_core::types::DbId) -> Self {
        Self {
            message,
            id: Some(id),
        }
    }
}
