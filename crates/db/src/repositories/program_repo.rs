//! Repository for the `audio_entries` table.

use krushi_core::types::DbId;
use sqlx::PgPool;

use crate::models::program::{CreateProgram, Program, UpdateProgram, UpdatedProgram};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, program_name, date, category, description, \
    audio_url, file_name, created_at, updated_at";

/// Provides CRUD operations for catalog programs.
pub struct ProgramRepo;

impl ProgramRepo {
    /// Insert a new program, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProgram) -> Result<Program, sqlx::Error> {
        let query = format!(
            "INSERT INTO audio_entries
                (program_name, date, category, description, audio_url, file_name)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Program>(&query)
            .bind(&input.program_name)
            .bind(input.date)
            .bind(&input.category)
            .bind(&input.description)
            .bind(input.audio.as_ref().map(|a| a.audio_url.as_str()))
            .bind(input.audio.as_ref().map(|a| a.file_name.as_str()))
            .fetch_one(pool)
            .await
    }

    /// Find a program by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Program>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audio_entries WHERE id = $1");
        sqlx::query_as::<_, Program>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every program, newest broadcast date first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Program>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audio_entries ORDER BY date DESC, id DESC");
        sqlx::query_as::<_, Program>(&query).fetch_all(pool).await
    }

    /// Update a program's metadata and, when `input.audio` is set, its blob
    /// reference.
    ///
    /// The row is locked while it is read, so `previous_file_name` is the
    /// blob this update actually replaced even under concurrent edits.
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProgram,
    ) -> Result<Option<UpdatedProgram>, sqlx::Error> {
        let query = "WITH previous AS (
                SELECT id, file_name FROM audio_entries WHERE id = $1 FOR UPDATE
             )
             UPDATE audio_entries AS e SET
                program_name = $2,
                date = $3,
                category = $4,
                description = $5,
                audio_url = COALESCE($6, e.audio_url),
                file_name = COALESCE($7, e.file_name)
             FROM previous
             WHERE e.id = previous.id
             RETURNING e.id, e.program_name, e.date, e.category, e.description,
                e.audio_url, e.file_name, e.created_at, e.updated_at,
                previous.file_name AS previous_file_name";
        sqlx::query_as::<_, UpdatedProgram>(query)
            .bind(id)
            .bind(&input.program_name)
            .bind(input.date)
            .bind(&input.category)
            .bind(&input.description)
            .bind(input.audio.as_ref().map(|a| a.audio_url.as_str()))
            .bind(input.audio.as_ref().map(|a| a.file_name.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Permanently delete a program by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM audio_entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
