//! Request handlers.
//!
//! Handlers delegate persistence to `krushi_db` repositories and blob I/O to
//! the configured [`krushi_storage::BlobStore`], mapping errors via
//! [`AppError`](crate::error::AppError).

pub mod audio;
pub mod library;
pub mod media;
pub mod settings;
