//! Core domain logic for HealthVault.
//! This crate is the single source of truth for record ownership and id
//! uniqueness invariants.

pub mod api;
pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{ApiResponse, RecordApi};
pub use config::CoreConfig;
pub use identity::{FixedIdentity, IdentityContext, Principal, ANONYMOUS_PRINCIPAL_TEXT};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{AddRecordRequest, HealthRecord, RecordId, RecordValidationError};
pub use repo::id_gen::{IdGenerator, SqliteSequenceIdGenerator, UuidIdGenerator};
pub use repo::record_repo::{RecordStore, RepoError, RepoResult, SqliteRecordStore};
pub use service::record_service::{RecordService, ServiceError, ServiceResult};

/// Constant liveness answer; touches no state.
pub fn health_check() -> &'static str {
    "Health Records Backend is running"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
