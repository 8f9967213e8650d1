//! Domain logic for the Krushi Radio program catalog.
//!
//! Nothing in this crate performs I/O: the database, blob storage and HTTP
//! layers build on these types and rules.

pub mod error;
pub mod library;
pub mod program;
pub mod stats;
pub mod types;
