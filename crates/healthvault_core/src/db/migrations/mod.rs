//! Record store schema steps and the post-upgrade bookkeeping check.
//!
//! # Responsibility
//! - Upgrade a database to the newest record store schema in one transaction.
//! - Refuse stores whose id sequence or id ledger cannot guarantee that
//!   record ids are never issued twice.
//!
//! # Invariants
//! - Steps are listed in increasing `version` order.
//! - The check runs on every open, also when no step was pending.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, Transaction};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "records",
        sql: include_str!("0001_records.sql"),
    },
    SchemaStep {
        version: 2,
        name: "id_ledger",
        sql: include_str!("0002_id_ledger.sql"),
    },
];

/// Newest schema version this build writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Upgrades `conn` to [`latest_version`] and checks the id bookkeeping.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().skip_while(|step| step.version <= from_version) {
        run_step(&tx, step)?;
    }
    if let Err(err) = check_id_bookkeeping(&tx) {
        error!(
            "event=store_check module=db status=error corrupt={} error={}",
            err.is_corrupt_store(),
            err
        );
        return Err(err);
    }
    tx.commit()?;
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    info!(
        "event=db_migrate module=db status=ok step={} version={}",
        step.name, step.version
    );
    Ok(())
}

fn check_id_bookkeeping(conn: &Connection) -> DbResult<()> {
    let sequence_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM record_id_sequence;", [], |row| row.get(0))?;
    if sequence_rows != 1 {
        return Err(DbError::IdSequenceRows(sequence_rows));
    }

    let unledgered: i64 = conn.query_row(
        "SELECT COUNT(*)
         FROM health_records AS r
         LEFT JOIN record_id_ledger AS l ON l.id = r.id
         WHERE l.id IS NULL;",
        [],
        |row| row.get(0),
    )?;
    if unledgered > 0 {
        return Err(DbError::UnledgeredRecords(unledgered));
    }
    Ok(())
}
