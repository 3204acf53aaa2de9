//! # Service Error Taxonomy
//!
//! One enum folding every rejection the pipeline can produce. Each
//! variant preserves the structured error from the crate that raised
//! it; none is fatal to the process.

use thiserror::Error;

use labops_custody::CustodyError;
use labops_lifecycle::{RouteError, TransitionError};
use labops_tenancy::{ConcurrencyError, TenancyError};

/// Any failure of a governance operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Context resolution or authorization failed.
    #[error(transparent)]
    Tenancy(#[from] TenancyError),

    /// The write lost an optimistic-concurrency race.
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    /// The lifecycle state machine rejected the transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A route-level operation failed.
    #[error(transparent)]
    Route(RouteError),

    /// Custody recording failed.
    #[error(transparent)]
    Custody(#[from] CustodyError),

    /// The referenced entity does not exist.
    #[error("unknown {kind}: {id}")]
    UnknownEntity {
        /// What kind of entity was looked up.
        kind: &'static str,
        /// Display form of the identifier.
        id: String,
    },
}

// RouteError carries a TransitionError of its own; unwrap it so callers
// see one transition variant regardless of which layer rejected.
impl From<RouteError> for ServiceError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::Transition(inner) => ServiceError::Transition(inner),
            other => ServiceError::Route(other),
        }
    }
}
