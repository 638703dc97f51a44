//! Domain model for health-record metadata.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every record is identified by a store-wide unique `RecordId`.
//! - Deletion is a hard delete; identifiers are still never reused.

pub mod record;
