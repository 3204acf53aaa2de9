//! # labops-service
//!
//! The governance pipeline for the LabOps logistics stack. Composes
//! the lower crates behind one entry point per mutation class:
//!
//! - [`Governance::transition_pickup`] — pickup request lifecycle,
//! - [`Governance::complete_stop`] — stop completion with custody
//!   recording and delivery-location validation,
//! - [`Governance::record_custody_event`] — direct ledger appends,
//! - [`Governance::update_case`] — version-controlled case updates.
//!
//! Every operation threads an explicit tenant context, runs fail-closed
//! authorization and the optimistic version check before any domain
//! logic, audit-logs denials and conflicts before returning them, and
//! stages outbound events only after the write has committed.

pub mod error;
pub mod outbox;
pub mod pipeline;
pub mod telemetry;

pub use error::ServiceError;
pub use outbox::{Outbox, OutboundEvent};
pub use pipeline::{CaseUpdate, CompleteStop, Governance, TransitionPickup};
pub use telemetry::init_tracing;
