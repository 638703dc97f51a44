//! SQLite bootstrap for the record store.
//!
//! # Responsibility
//! - Open connections configured for one writer and concurrent readers.
//! - Bring the schema to the latest version and check the id bookkeeping
//!   before any record is read or written.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A usable store has exactly one id sequence row.
//! - Every live record id is also present in the id ledger.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failures raised while opening or checking a record store database.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build.
    UnsupportedSchemaVersion { db_version: u32, latest_supported: u32 },
    /// `record_id_sequence` does not hold exactly one row.
    IdSequenceRows(i64),
    /// Live records whose ids never reached the ledger; such ids could be
    /// issued again.
    UnledgeredRecords(i64),
}

impl DbError {
    /// True when the schema is current but the stored id bookkeeping is broken.
    pub fn is_corrupt_store(&self) -> bool {
        matches!(self, Self::IdSequenceRows(_) | Self::UnledgeredRecords(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "record store schema v{db_version} is newer than this build (v{latest_supported})"
            ),
            Self::IdSequenceRows(rows) => {
                write!(f, "record id sequence has {rows} rows, expected exactly 1")
            }
            Self::UnledgeredRecords(count) => {
                write!(f, "{count} record(s) missing from the id ledger")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
