//! Program (audio entry) model and DTOs.

use krushi_core::library::LibraryItem;
use krushi_core::program::ProgramFields;
use krushi_core::types::{BroadcastDate, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `audio_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Program {
    pub id: DbId,
    pub program_name: String,
    pub date: BroadcastDate,
    pub category: String,
    pub description: String,
    pub audio_url: Option<String>,
    pub file_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl LibraryItem for Program {
    fn id(&self) -> DbId {
        self.id
    }

    fn name(&self) -> &str {
        &self.program_name
    }

    fn category(&self) -> &str {
        &self.category
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn date(&self) -> BroadcastDate {
        self.date
    }
}

/// A row after an update, with the blob it referenced beforehand.
#[derive(Debug, Clone, FromRow)]
pub struct UpdatedProgram {
    #[sqlx(flatten)]
    pub program: Program,
    pub previous_file_name: Option<String>,
}

/// Location of a stored audio blob.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoredAudio {
    pub audio_url: String,
    pub file_name: String,
}

/// DTO for creating a new program.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgram {
    pub program_name: String,
    pub date: BroadcastDate,
    pub category: String,
    pub description: String,
    pub audio: Option<StoredAudio>,
}

/// DTO for editing a program.
///
/// The metadata fields are always replaced. `audio` is only written when a
/// new file was uploaded; `None` keeps the current blob.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProgram {
    pub program_name: String,
    pub date: BroadcastDate,
    pub category: String,
    pub description: String,
    pub audio: Option<StoredAudio>,
}

impl CreateProgram {
    pub fn new(fields: ProgramFields, audio: Option<StoredAudio>) -> Self {
        Self {
            program_name: fields.program_name,
            date: fields.date,
            category: fields.category,
            description: fields.description,
            audio,
        }
    }
}

impl UpdateProgram {
    pub fn new(fields: ProgramFields, audio: Option<StoredAudio>) -> Self {
        Self {
            program_name: fields.program_name,
            date: fields.date,
            category: fields.category,
            description: fields.description,
            audio,
        }
    }
}
