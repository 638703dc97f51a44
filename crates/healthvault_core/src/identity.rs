//! Caller identity primitives.
//!
//! # Responsibility
//! - Represent an already-verified caller as an opaque, comparable token.
//! - Resolve the caller for one operation through `IdentityContext`.
//!
//! # Invariants
//! - Core never verifies signatures; the surrounding transport does.
//! - Blank identity text resolves to the anonymous principal.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Textual form of the anonymous principal.
pub const ANONYMOUS_PRINCIPAL_TEXT: &str = "2vxsx-fae";

/// Verified caller identity. Also the owner key for stored records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    /// Builds a principal from its textual form.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::anonymous();
        }
        if trimmed.len() == text.len() {
            Self(text)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_PRINCIPAL_TEXT.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_PRINCIPAL_TEXT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the verified caller for the current call.
pub trait IdentityContext {
    fn caller(&self) -> Principal;
}

impl IdentityContext for Principal {
    fn caller(&self) -> Principal {
        self.clone()
    }
}

/// Identity context pinned to one principal for its whole lifetime.
///
/// Used by single-caller surfaces such as the CLI and by tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity {
    principal: Principal,
}

impl FixedIdentity {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn anonymous() -> Self {
        Self::new(Principal::anonymous())
    }
}

impl IdentityContext for FixedIdentity {
    fn caller(&self) -> Principal {
        self.principal.clone()
    }
}
