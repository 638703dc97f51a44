//! Outward operation surface with uniform response envelopes.
//!
//! # Responsibility
//! - Resolve the caller through `IdentityContext` for every call.
//! - Convert typed service results into `ApiResponse` envelopes.
//!
//! # Invariants
//! - Functions here never panic and never return `Err`; every failure is
//!   an envelope with `success=false` and a human-readable message.
//! - `data` is present only on successful list/get/add outcomes.

use crate::identity::{IdentityContext, Principal};
use crate::model::record::{AddRecordRequest, HealthRecord};
use crate::repo::id_gen::IdGenerator;
use crate::repo::record_repo::RecordStore;
use crate::service::record_service::{RecordService, ServiceError, ServiceResult};
use log::warn;
use serde::{Deserialize, Serialize};

/// Uniform response envelope for mutating and listing operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<HealthRecord>>,
}

impl ApiResponse {
    fn success(message: impl Into<String>, data: Option<Vec<HealthRecord>>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    fn failure(err: &ServiceError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
        }
    }

    /// Records carried by this envelope, empty when there is no `data`.
    pub fn records(&self) -> &[HealthRecord] {
        self.data.as_deref().unwrap_or_default()
    }
}

/// Envelope-producing facade over `RecordService`.
pub struct RecordApi<S: RecordStore, G: IdGenerator> {
    service: RecordService<S, G>,
}

impl<S: RecordStore, G: IdGenerator> RecordApi<S, G> {
    pub fn new(service: RecordService<S, G>) -> Self {
        Self { service }
    }

    /// Creates a record for the caller; `data` holds the created record.
    pub fn add_record(&self, ctx: &impl IdentityContext, request: AddRecordRequest) -> ApiResponse {
        let caller = ctx.caller();
        envelope(
            "add_record",
            self.service.add_record(&caller, request),
            |record| ("Record added successfully".to_string(), vec![record]),
        )
    }

    /// Lists the caller's records; an empty list is still a success.
    pub fn get_my_records(&self, ctx: &impl IdentityContext) -> ApiResponse {
        let caller = ctx.caller();
        envelope("get_my_records", self.service.list_records(&caller), |records| {
            (format!("Found {} records", records.len()), records)
        })
    }

    /// Fetches one of the caller's records as a single-element `data`.
    pub fn get_record_by_id(&self, ctx: &impl IdentityContext, id: &str) -> ApiResponse {
        let caller = ctx.caller();
        envelope(
            "get_record_by_id",
            self.service.get_record(&caller, id),
            |record| ("Record found".to_string(), vec![record]),
        )
    }

    /// Deletes one of the caller's records.
    pub fn delete_record(&self, ctx: &impl IdentityContext, id: &str) -> ApiResponse {
        let caller = ctx.caller();
        match self.service.delete_record(&caller, id) {
            Ok(()) => ApiResponse::success("Record deleted successfully", None),
            Err(err) => failure("delete_record", &err),
        }
    }

    /// Number of records the caller owns; `0` when the count is unavailable.
    ///
    /// Rows are counted with `COUNT(*)` and never parsed, so a corrupt row
    /// still counts even though listing it fails.
    pub fn get_record_count(&self, ctx: &impl IdentityContext) -> u64 {
        let caller = ctx.caller();
        self.service.count_records(&caller).unwrap_or_default()
    }

    pub fn health_check(&self) -> &'static str {
        crate::health_check()
    }

    /// Echoes the resolved caller.
    pub fn whoami(&self, ctx: &impl IdentityContext) -> Principal {
        ctx.caller()
    }
}

fn envelope<T>(
    op: &'static str,
    result: ServiceResult<T>,
    on_ok: impl FnOnce(T) -> (String, Vec<HealthRecord>),
) -> ApiResponse {
    match result {
        Ok(value) => {
            let (message, data) = on_ok(value);
            ApiResponse::success(message, Some(data))
        }
        Err(err) => failure(op, &err),
    }
}

fn failure(op: &'static str, err: &ServiceError) -> ApiResponse {
    // Internal failures were already logged at error level by the service.
    if !err.is_internal() {
        warn!("event={} module=api status=rejected reason={}", op, err);
    }
    ApiResponse::failure(err)
}
