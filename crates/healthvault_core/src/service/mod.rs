//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the envelope boundary decoupled from storage details.

pub mod record_service;
