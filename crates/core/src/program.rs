//! Program (audio entry) field rules.
//!
//! Validation of the submitted form fields, naming of stored audio blobs,
//! and the small amount of MIME handling the upload and download paths need.

use chrono::{DateTime, NaiveDate};

use crate::error::CoreError;
use crate::types::BroadcastDate;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a program name, in characters.
pub const MAX_PROGRAM_NAME_LEN: usize = 255;

/// Maximum length of a category label, in characters.
pub const MAX_CATEGORY_LEN: usize = 100;

/// Maximum length of a description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 5000;

/// Content type used when nothing better is known.
pub const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// File name offered for downloads whose stored name is unknown.
pub const DEFAULT_DOWNLOAD_NAME: &str = "audio.mp3";

/// Audio extensions accepted for upload, with their MIME types.
const AUDIO_EXTENSIONS: &[(&str, &str)] = &[
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("ogg", "audio/ogg"),
    ("oga", "audio/ogg"),
    ("opus", "audio/opus"),
    ("flac", "audio/flac"),
    ("webm", "audio/webm"),
];

// ---------------------------------------------------------------------------
// Form fields
// ---------------------------------------------------------------------------

/// Text fields exactly as they arrived in the multipart form.
///
/// Every field is optional here; [`validate_program_fields`] decides what is
/// actually required.
#[derive(Debug, Clone, Default)]
pub struct RawProgramFields {
    pub program_name: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Validated, trimmed program metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramFields {
    pub program_name: String,
    pub date: BroadcastDate,
    pub category: String,
    pub description: String,
}

/// Validate the submitted text fields of a program.
///
/// All four fields are required. Values are trimmed before length checks.
pub fn validate_program_fields(raw: &RawProgramFields) -> Result<ProgramFields, CoreError> {
    let program_name = required_text(
        raw.program_name.as_deref(),
        "programName",
        MAX_PROGRAM_NAME_LEN,
    )?;
    let category = required_text(raw.category.as_deref(), "category", MAX_CATEGORY_LEN)?;
    let description = required_text(
        raw.description.as_deref(),
        "description",
        MAX_DESCRIPTION_LEN,
    )?;

    let date_raw = raw
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| CoreError::Validation("Missing required field 'date'".into()))?;
    let date = parse_broadcast_date(date_raw)?;

    Ok(ProgramFields {
        program_name,
        date,
        category,
        description,
    })
}

fn required_text(value: Option<&str>, field: &str, max_len: usize) -> Result<String, CoreError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Validation(format!("Missing required field '{field}'")))?;

    if value.chars().count() > max_len {
        return Err(CoreError::Validation(format!(
            "Field '{field}' must be at most {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

/// Parse a broadcast date.
///
/// Accepts `YYYY-MM-DD` (what a date input submits) and RFC 3339 timestamps,
/// in which case only the date part is kept.
pub fn parse_broadcast_date(value: &str) -> Result<BroadcastDate, CoreError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.date_naive());
    }
    Err(CoreError::Validation(format!(
        "Invalid date '{value}'. Expected YYYY-MM-DD"
    )))
}

// ---------------------------------------------------------------------------
// Stored file naming
// ---------------------------------------------------------------------------

/// Build the stored blob name for an upload: `{millis}-{original}`.
///
/// Only the final path component of `original` is kept and characters
/// outside `[A-Za-z0-9._-]` are replaced with `_`.
pub fn unique_file_name(now_millis: i64, original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or("");

    let mut clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    while clean.contains("..") {
        clean = clean.replace("..", ".");
    }
    let clean = clean.trim_start_matches('.');

    if clean.is_empty() {
        format!("{now_millis}-audio")
    } else {
        format!("{now_millis}-{clean}")
    }
}

/// Lower-cased extension of `file_name`, if it has one.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// MIME type for an audio file name, defaulting to `audio/mpeg`.
pub fn content_type_for_file_name(file_name: &str) -> &'static str {
    file_extension(file_name)
        .and_then(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE)
}

/// Check that an uploaded file looks like audio.
///
/// The declared content type wins when it is `audio/*`; otherwise the
/// extension must be one of the known audio extensions.
pub fn validate_audio_upload(
    file_name: &str,
    content_type: Option<&str>,
    size: usize,
) -> Result<(), CoreError> {
    if size == 0 {
        return Err(CoreError::Validation("Uploaded audio file is empty".into()));
    }

    if content_type.is_some_and(|ct| ct.starts_with("audio/")) {
        return Ok(());
    }

    let known = file_extension(file_name)
        .is_some_and(|ext| AUDIO_EXTENSIONS.iter().any(|(known, _)| *known == ext));
    if known {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "'{file_name}' is not an audio file"
        )))
    }
}

// ---------------------------------------------------------------------------
// Serving and downloading
// ---------------------------------------------------------------------------

/// Check a file name requested from the local upload directory.
///
/// Rejects anything that could escape the directory.
pub fn sanitize_served_file_name(file_name: &str) -> Result<&str, CoreError> {
    let bad = file_name.is_empty()
        || file_name.starts_with('.')
        || file_name.contains(['/', '\\', '\0'])
        || file_name.contains("..");
    if bad {
        return Err(CoreError::Validation(format!(
            "Invalid file name '{file_name}'"
        )));
    }
    Ok(file_name)
}

/// `Content-Disposition` value that makes a browser save the response.
pub fn attachment_disposition(file_name: Option<&str>) -> String {
    let name = file_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_DOWNLOAD_NAME);
    let safe: String = name
        .chars()
        .map(|c| if c == '"' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
