//! Handlers for the `/api/audio` resource.
//!
//! Create and update take a multipart form carrying the program metadata
//! and an optional `audioFile`. A new file is stored before the row is
//! written; a superseded or deleted blob is removed best-effort afterwards.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use krushi_core::program::{
    content_type_for_file_name, unique_file_name, validate_audio_upload, validate_program_fields,
    RawProgramFields,
};
use krushi_core::types::DbId;
use krushi_db::models::program::{CreateProgram, Program, StoredAudio, UpdateProgram};
use krushi_db::repositories::ProgramRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::MessageResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Multipart form
// ---------------------------------------------------------------------------

/// An `audioFile` part as received.
struct UploadedAudio {
    file_name: String,
    content_type: Option<String>,
    data: Bytes,
}

/// Everything a create or update form may carry.
#[derive(Default)]
struct ProgramForm {
    id: Option<String>,
    fields: RawProgramFields,
    audio: Option<UploadedAudio>,
}

async fn read_program_form(mut multipart: Multipart) -> AppResult<ProgramForm> {
    let mut form = ProgramForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "audioFile" {
            let file_name = field.file_name().unwrap_or("").to_string();
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            // Browsers send an empty part when no file was picked.
            if !file_name.is_empty() || !data.is_empty() {
                form.audio = Some(UploadedAudio {
                    file_name,
                    content_type,
                    data,
                });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "id" => form.id = Some(text),
            "programName" => form.fields.program_name = Some(text),
            "date" => form.fields.date = Some(text),
            "category" => form.fields.category = Some(text),
            "description" => form.fields.description = Some(text),
            _ => {} // ignore unknown fields
        }
    }

    Ok(form)
}

/// Validate and store an uploaded file under a fresh unique name.
async fn store_upload(state: &AppState, upload: UploadedAudio) -> AppResult<StoredAudio> {
    validate_audio_upload(
        &upload.file_name,
        upload.content_type.as_deref(),
        upload.data.len(),
    )?;

    let file_name = unique_file_name(Utc::now().timestamp_millis(), &upload.file_name);
    let content_type = upload
        .content_type
        .as_deref()
        .filter(|ct| ct.starts_with("audio/"))
        .unwrap_or_else(|| content_type_for_file_name(&file_name));
    let size = upload.data.len();

    let blob = state.store.put(&file_name, upload.data, content_type).await?;
    tracing::info!(
        file_name = %blob.file_name,
        size,
        backend = state.store.backend_name(),
        "Audio file stored",
    );

    Ok(StoredAudio {
        audio_url: blob.url,
        file_name: blob.file_name,
    })
}

/// Remove a blob, logging rather than failing when it cannot be removed.
async fn discard_blob(state: &AppState, file_name: &str) {
    if let Err(e) = state.store.delete(file_name).await {
        tracing::warn!(file_name, error = %e, "Failed to remove audio file");
    }
}

fn parse_id(raw: Option<&str>) -> AppResult<DbId> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing required field 'id'".into()))?;
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid id '{raw}'")))
}

fn program_not_found() -> AppError {
    AppError::NotFound("Program not found".into())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/audio
///
/// All programs, newest broadcast date first.
pub async fn list_programs(State(state): State<AppState>) -> AppResult<Json<Vec<Program>>> {
    let programs = ProgramRepo::list(&state.pool).await?;
    Ok(Json(programs))
}

/// GET /api/audio/{id}
pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Program>> {
    let program = ProgramRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(program_not_found)?;
    Ok(Json(program))
}

/// POST /api/audio
///
/// Multipart form: `programName`, `date`, `category`, `description` and an
/// optional `audioFile`.
pub async fn create_program(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let form = read_program_form(multipart).await?;
    let fields = validate_program_fields(&form.fields)?;

    let audio = match form.audio {
        Some(upload) => Some(store_upload(&state, upload).await?),
        None => None,
    };
    let stored_name = audio.as_ref().map(|a| a.file_name.clone());

    let input = CreateProgram::new(fields, audio);
    let program = match ProgramRepo::create(&state.pool, &input).await {
        Ok(program) => program,
        Err(e) => {
            if let Some(name) = stored_name.as_deref() {
                discard_blob(&state, name).await;
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        program_id = program.id,
        program_name = %program.program_name,
        has_audio = program.file_name.is_some(),
        "Program created",
    );

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::with_id(
            "Audio entry added successfully",
            program.id,
        )),
    ))
}

/// PUT /api/audio
///
/// Same form as create plus a required `id`. Without `audioFile` the
/// current audio is kept.
pub async fn update_program(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<MessageResponse>> {
    let form = read_program_form(multipart).await?;
    let id = parse_id(form.id.as_deref())?;
    let fields = validate_program_fields(&form.fields)?;

    // Unknown ids are rejected before anything is uploaded.
    if ProgramRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(program_not_found());
    }

    let audio = match form.audio {
        Some(upload) => Some(store_upload(&state, upload).await?),
        None => None,
    };
    let stored_name = audio.as_ref().map(|a| a.file_name.clone());

    let input = UpdateProgram::new(fields, audio);
    let outcome = ProgramRepo::update(&state.pool, id, &input).await;
    if !matches!(outcome, Ok(Some(_))) {
        if let Some(name) = stored_name.as_deref() {
            discard_blob(&state, name).await;
        }
    }
    let updated = outcome?.ok_or_else(program_not_found)?;

    // The old blob is only dropped once the row points at the new one.
    let replaced = stored_name
        .as_deref()
        .and(updated.previous_file_name.as_deref())
        .filter(|old| stored_name.as_deref() != Some(*old));
    if let Some(old_name) = replaced {
        discard_blob(&state, old_name).await;
    }

    tracing::info!(
        program_id = updated.program.id,
        replaced_audio = stored_name.is_some(),
        "Program updated",
    );

    Ok(Json(MessageResponse::new("Audio entry updated successfully")))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

/// DELETE /api/audio?id=N
pub async fn delete_program(
    State(state): State<AppState>,
    Query(params): Query<DeleteParams>,
) -> AppResult<Json<MessageResponse>> {
    let id = parse_id(params.id.as_deref())?;

    let program = ProgramRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(program_not_found)?;

    if let Some(file_name) = program.file_name.as_deref() {
        discard_blob(&state, file_name).await;
    }

    if !ProgramRepo::delete(&state.pool, id).await? {
        return Err(program_not_found());
    }

    tracing::info!(program_id = id, "Program deleted");
    Ok(Json(MessageResponse::new("Audio entry deleted successfully")))
}
