//! Owner-scoped record store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the store-level insert/list/get/delete/count primitives.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every read and delete filters on `owner`; a foreign id behaves exactly
//!   like an absent one.
//! - `insert` refuses any id that was ever issued to this store, live or
//!   deleted, and never overwrites an existing row.
//! - Lists come back in insertion order.
//! - Write paths validate records before SQL mutations; read paths reject
//!   invalid persisted rows instead of masking them.

use crate::db::DbError;
use crate::identity::Principal;
use crate::model::record::{HealthRecord, RecordId, RecordValidationError};
use crate::repo::ensure_tables_exist;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    title,
    record_type,
    date,
    encrypted_url,
    file_size,
    created_at
FROM health_records";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and id issuance.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    /// An id handed to `insert` was already issued by this store.
    DuplicateId(RecordId),
    /// The id generator cannot advance any further.
    IdSpaceExhausted,
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl RepoError {
    /// Whether this error signals a defect rather than a caller mistake.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId(_) | Self::IdSpaceExhausted | Self::InvalidData(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "record id already issued: {id}"),
            Self::IdSpaceExhausted => write!(f, "record id space exhausted"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Owner-partitioned record storage.
///
/// `owner` is an explicit parameter on every operation so isolation is
/// decided here and nowhere else.
pub trait RecordStore {
    /// Appends `record` to `owner`'s collection.
    fn insert(&self, owner: &Principal, record: &HealthRecord) -> RepoResult<()>;
    /// Returns every record of `owner` in creation order.
    fn list(&self, owner: &Principal) -> RepoResult<Vec<HealthRecord>>;
    /// Returns the record only when it exists and belongs to `owner`.
    fn get(&self, owner: &Principal, id: &str) -> RepoResult<Option<HealthRecord>>;
    /// Removes the record when it belongs to `owner`; reports whether a row went away.
    fn delete(&self, owner: &Principal, id: &str) -> RepoResult<bool>;
    fn count(&self, owner: &Principal) -> RepoResult<u64>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables_exist(conn, &["health_records", "record_id_ledger"])?;
        Ok(Self { conn })
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn insert(&self, owner: &Principal, record: &HealthRecord) -> RepoResult<()> {
        record.validate()?;

        // Immediate mode takes the database-wide write lock up front, so the
        // ledger check and both inserts land as one unit.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if id_ever_issued(&tx, &record.id)? {
            error!(
                "event=record_insert module=repo status=error error_code=duplicate_id record_id={}",
                record.id
            );
            return Err(RepoError::DuplicateId(record.id.clone()));
        }

        tx.execute(
            "INSERT INTO record_id_ledger (id, issued_at) VALUES (?1, ?2);",
            params![record.id.as_str(), u64_to_db(record.created_at)],
        )?;
        tx.execute(
            "INSERT INTO health_records (
                id,
                owner,
                title,
                record_type,
                date,
                encrypted_url,
                file_size,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id.as_str(),
                owner.as_str(),
                record.title.as_str(),
                record.record_type.as_str(),
                u64_to_db(record.date),
                record.encrypted_url.as_str(),
                record.file_size.map(u64_to_db),
                u64_to_db(record.created_at),
            ],
        )?;
        tx.commit()?;

        debug!(
            "event=record_insert module=repo status=ok record_id={}",
            record.id
        );
        Ok(())
    }

    fn list(&self, owner: &Principal) -> RepoResult<Vec<HealthRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE owner = ?1
             ORDER BY rowid ASC;"
        ))?;
        let mut rows = stmt.query([owner.as_str()])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn get(&self, owner: &Principal, id: &str) -> RepoResult<Option<HealthRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE owner = ?1
               AND id = ?2;"
        ))?;

        let mut rows = stmt.query(params![owner.as_str(), id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }

        Ok(None)
    }

    fn delete(&self, owner: &Principal, id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM health_records
             WHERE owner = ?1
               AND id = ?2;",
            params![owner.as_str(), id],
        )?;

        Ok(changed > 0)
    }

    fn count(&self, owner: &Principal) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM health_records WHERE owner = ?1;",
            [owner.as_str()],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative record count `{count}`")))
    }
}

/// Returns whether `id` was ever issued to this store, deleted ids included.
pub(crate) fn id_ever_issued(conn: &Connection, id: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM record_id_ledger WHERE id = ?1;",
            [id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<HealthRecord> {
    let record = HealthRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        record_type: row.get("record_type")?,
        date: u64_from_db(row.get("date")?),
        encrypted_url: row.get("encrypted_url")?,
        file_size: row.get::<_, Option<i64>>("file_size")?.map(u64_from_db),
        created_at: u64_from_db(row.get("created_at")?),
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(format!("record `{}`: {err}", record.id)))?;
    Ok(record)
}

// SQLite integers are signed 64-bit. Unsigned values are stored bit-for-bit,
// so the full u64 range round-trips.
fn u64_to_db(value: u64) -> i64 {
    value as i64
}

fn u64_from_db(value: i64) -> u64 {
    value as u64
}

#[cfg(test)]
mod tests {
    use super::{u64_from_db, u64_to_db, RepoError};
    use crate::model::record::RecordValidationError;

    #[test]
    fn unsigned_values_round_trip_through_signed_storage() {
        for value in [0, 1, i64::MAX as u64, u64::MAX] {
            assert_eq!(u64_from_db(u64_to_db(value)), value);
        }
    }

    #[test]
    fn invariant_violations_are_distinguished_from_validation() {
        assert!(RepoError::DuplicateId("hr-1".to_string()).is_invariant_violation());
        assert!(RepoError::IdSpaceExhausted.is_invariant_violation());
        assert!(!RepoError::Validation(RecordValidationError::EmptyTitle).is_invariant_violation());
    }
}
