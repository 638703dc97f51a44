//! Health record use-case service.
//!
//! # Responsibility
//! - Compose id issuance and owner-scoped storage into add/list/get/delete/
//!   count use-cases for one resolved caller.
//! - Classify failures into caller mistakes and internal defects.
//!
//! # Invariants
//! - The anonymous principal can neither read nor write records.
//! - Absent ids and ids owned by someone else yield the same `NotFound`.
//! - Internal defects are logged at `error` level before they are returned.

use crate::identity::Principal;
use crate::model::record::{AddRecordRequest, HealthRecord, RecordId, RecordValidationError};
use crate::repo::id_gen::IdGenerator;
use crate::repo::record_repo::{RecordStore, RepoError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for record use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Anonymous caller attempted to create a record.
    AnonymousWrite,
    /// Anonymous caller attempted a read or delete.
    Unauthenticated,
    Validation(RecordValidationError),
    /// Record is absent or owned by another principal.
    NotFound(RecordId),
    /// Storage failure or broken store invariant.
    Internal(RepoError),
}

impl ServiceError {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnonymousWrite => write!(f, "Anonymous users cannot add records"),
            Self::Unauthenticated => write!(f, "Authentication required"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(_) => write!(f, "Record not found or access denied"),
            Self::Internal(err) => write!(f, "Internal error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Internal(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RecordValidationError> for ServiceError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Record service over a store and an id generator.
///
/// Both collaborators usually borrow the same SQLite connection.
pub struct RecordService<S: RecordStore, G: IdGenerator> {
    store: S,
    ids: G,
}

impl<S: RecordStore, G: IdGenerator> RecordService<S, G> {
    pub fn new(store: S, ids: G) -> Self {
        Self { store, ids }
    }

    /// Creates one record owned by `caller`.
    ///
    /// # Contract
    /// - Rejects anonymous callers and blank `title`/`record_type`.
    /// - Assigns `id` and `created_at`; `date` defaults to `created_at`.
    /// - Returns the record exactly as stored.
    pub fn add_record(
        &self,
        caller: &Principal,
        request: AddRecordRequest,
    ) -> ServiceResult<HealthRecord> {
        if caller.is_anonymous() {
            return Err(ServiceError::AnonymousWrite);
        }
        request.validate()?;

        let id = self
            .ids
            .next_id()
            .map_err(|err| internal("record_add", err))?;
        let record = HealthRecord::from_request(id, request, current_epoch_secs());
        self.store
            .insert(caller, &record)
            .map_err(|err| internal("record_add", err))?;

        info!(
            "event=record_add module=service status=ok owner={} record_id={}",
            caller, record.id
        );
        Ok(record)
    }

    /// Lists every record of `caller` in creation order.
    pub fn list_records(&self, caller: &Principal) -> ServiceResult<Vec<HealthRecord>> {
        require_authenticated(caller)?;
        self.store
            .list(caller)
            .map_err(|err| internal("record_list", err))
    }

    /// Fetches one record of `caller`.
    pub fn get_record(&self, caller: &Principal, id: &str) -> ServiceResult<HealthRecord> {
        require_authenticated(caller)?;
        self.store
            .get(caller, id)
            .map_err(|err| internal("record_get", err))?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Deletes one record of `caller`.
    pub fn delete_record(&self, caller: &Principal, id: &str) -> ServiceResult<()> {
        require_authenticated(caller)?;
        let removed = self
            .store
            .delete(caller, id)
            .map_err(|err| internal("record_delete", err))?;
        if !removed {
            return Err(ServiceError::NotFound(id.to_string()));
        }

        info!(
            "event=record_delete module=service status=ok owner={} record_id={}",
            caller, id
        );
        Ok(())
    }

    /// Counts records of `caller` without validating them. Anonymous callers
    /// own nothing.
    pub fn count_records(&self, caller: &Principal) -> ServiceResult<u64> {
        if caller.is_anonymous() {
            return Ok(0);
        }
        self.store
            .count(caller)
            .map_err(|err| internal("record_count", err))
    }
}

fn require_authenticated(caller: &Principal) -> ServiceResult<()> {
    if caller.is_anonymous() {
        return Err(ServiceError::Unauthenticated);
    }
    Ok(())
}

fn internal(event: &'static str, err: RepoError) -> ServiceError {
    if err.is_invariant_violation() {
        error!(
            "event=invariant_violation module=service status=error op={} error={}",
            event, err
        );
    } else {
        error!(
            "event={} module=service status=error error_code=storage_failed error={}",
            event, err
        );
    }
    ServiceError::Internal(err)
}

fn current_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
