//! Canonical record identifiers.
//!
//! Every persisted record (identity, patient, doctor, assignment) is keyed by a UUID stored in a
//! *canonical* representation: **32 lowercase hexadecimal characters** (no hyphens).
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Externally supplied identifiers (request paths, request bodies, CLI arguments) must already
//! be canonical. Use [`RecordId::parse`] to validate an input string; hyphenated or uppercase
//! forms are rejected rather than normalised.

mod service;

pub use service::RecordId;

/// Error type for UUID operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for UUID operations.
pub type UuidResult<T> = Result<T, UuidError>;
