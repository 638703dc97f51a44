//! Record id issuance.
//!
//! # Responsibility
//! - Hand out store-wide unique record ids.
//!
//! # Invariants
//! - The persisted sequence only moves forward, so an id is never issued
//!   twice, across deletes and process restarts alike.
//! - Sequence ids sort lexically in issue order.
//! - Random ids are checked against the id ledger before being returned.

use crate::model::record::RecordId;
use crate::repo::ensure_tables_exist;
use crate::repo::record_repo::{id_ever_issued, RepoError, RepoResult};
use log::{debug, error};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;

/// Prefix shared by every id this crate issues.
pub const RECORD_ID_PREFIX: &str = "hr-";

const MAX_RANDOM_ID_ATTEMPTS: usize = 4;

/// Source of fresh record ids.
pub trait IdGenerator {
    /// Returns an id no earlier call, on any connection, has returned.
    ///
    /// Fails with `RepoError::IdSpaceExhausted` when no further id exists.
    fn next_id(&self) -> RepoResult<RecordId>;
}

/// Monotonic counter persisted in `record_id_sequence`.
pub struct SqliteSequenceIdGenerator<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSequenceIdGenerator<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_exist(conn, &["record_id_sequence"])?;
        Ok(Self { conn })
    }

    /// Last value handed out, `0` when nothing was issued yet.
    pub fn current_value(&self) -> RepoResult<i64> {
        read_sequence(self.conn)
    }
}

impl IdGenerator for SqliteSequenceIdGenerator<'_> {
    fn next_id(&self) -> RepoResult<RecordId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = read_sequence(&tx)?;
        let Some(next) = current.checked_add(1) else {
            error!(
                "event=id_issue module=repo status=error error_code=id_space_exhausted current={}",
                current
            );
            return Err(RepoError::IdSpaceExhausted);
        };

        tx.execute(
            "UPDATE record_id_sequence SET value = ?1 WHERE singleton = 1;",
            [next],
        )?;
        tx.commit()?;

        Ok(format_sequence_id(next))
    }
}

/// Random UUID-based ids, checked against the ledger of issued ids.
///
/// Useful when ids must not reveal how many records a store holds.
pub struct UuidIdGenerator<'conn> {
    conn: &'conn Connection,
}

impl<'conn> UuidIdGenerator<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_exist(conn, &["record_id_ledger"])?;
        Ok(Self { conn })
    }
}

impl IdGenerator for UuidIdGenerator<'_> {
    fn next_id(&self) -> RepoResult<RecordId> {
        for _ in 0..MAX_RANDOM_ID_ATTEMPTS {
            let candidate = format!("{RECORD_ID_PREFIX}{}", Uuid::new_v4().simple());
            if !id_ever_issued(self.conn, &candidate)? {
                return Ok(candidate);
            }
            debug!("event=id_issue module=repo status=retry reason=ledger_hit");
        }

        error!(
            "event=id_issue module=repo status=error error_code=id_space_exhausted attempts={}",
            MAX_RANDOM_ID_ATTEMPTS
        );
        Err(RepoError::IdSpaceExhausted)
    }
}

/// Renders a sequence value as a record id.
pub fn format_sequence_id(value: i64) -> RecordId {
    format!("{RECORD_ID_PREFIX}{value:016x}")
}

fn read_sequence(conn: &Connection) -> RepoResult<i64> {
    conn.query_row(
        "SELECT value FROM record_id_sequence WHERE singleton = 1;",
        [],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .ok_or_else(|| RepoError::InvalidData("record_id_sequence row is missing".to_string()))
}
