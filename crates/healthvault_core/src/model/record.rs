//! Health record domain model.
//!
//! # Responsibility
//! - Define the stored metadata shape for one encrypted health document.
//! - Define the caller-supplied creation request and its validation rules.
//!
//! # Invariants
//! - `id` and `created_at` are assigned by core and never change afterwards.
//! - `title` and `record_type` are non-blank once stored.
//! - `encrypted_url` is an opaque pointer; core never interprets it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque record identifier, unique across the whole store.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = String;

/// Metadata for one externally stored, encrypted health document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: RecordId,
    pub title: String,
    pub record_type: String,
    /// Caller-facing logical date, Unix epoch seconds.
    pub date: u64,
    /// Pointer into the external blob store.
    pub encrypted_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Insertion time, Unix epoch seconds.
    pub created_at: u64,
}

/// Caller-supplied fields for creating a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRecordRequest {
    pub title: String,
    pub record_type: String,
    pub encrypted_url: String,
    #[serde(default)]
    pub file_size: Option<u64>,
    /// Defaults to the record's `created_at` when absent.
    #[serde(default)]
    pub date: Option<u64>,
}

/// Validation failures for record input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyTitle,
    EmptyRecordType,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Title cannot be empty"),
            Self::EmptyRecordType => write!(f, "Record type cannot be empty"),
        }
    }
}

impl Error for RecordValidationError {}

impl AddRecordRequest {
    /// Checks required fields after trimming surrounding whitespace.
    ///
    /// Title is checked before record type, so a request with both fields
    /// blank reports `EmptyTitle`.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        validate_labels(&self.title, &self.record_type)
    }
}

impl HealthRecord {
    /// Builds a record from a validated request.
    ///
    /// # Invariants
    /// - `title` and `record_type` are stored trimmed.
    /// - `date` falls back to `created_at` when the request omits it.
    /// - `encrypted_url` is kept verbatim.
    pub fn from_request(id: RecordId, request: AddRecordRequest, created_at: u64) -> Self {
        Self {
            id,
            title: request.title.trim().to_string(),
            record_type: request.record_type.trim().to_string(),
            date: request.date.unwrap_or(created_at),
            encrypted_url: request.encrypted_url,
            file_size: request.file_size,
            created_at,
        }
    }

    /// Validates stored-shape invariants.
    ///
    /// Used on both write and read paths so corrupted rows are rejected
    /// instead of being handed to callers.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        validate_labels(&self.title, &self.record_type)
    }
}

fn validate_labels(title: &str, record_type: &str) -> Result<(), RecordValidationError> {
    if title.trim().is_empty() {
        return Err(RecordValidationError::EmptyTitle);
    }
    if record_type.trim().is_empty() {
        return Err(RecordValidationError::EmptyRecordType);
    }
    Ok(())
}
