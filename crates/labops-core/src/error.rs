//! # Error Types
//!
//! Shared error type for the foundational crate. Domain crates define
//! their own structured error enums (`TransitionError`, `CustodyError`,
//! `TenancyError`, `ConcurrencyError`) close to the code that produces
//! them; `labops-service` folds those into the request-scoped taxonomy.
//!
//! All errors use `thiserror`. No error in the governance layer is fatal
//! to the process — each is scoped to one request or entity.

use thiserror::Error;

/// Errors produced by the foundational types themselves.
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Input failed a structural or format validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
