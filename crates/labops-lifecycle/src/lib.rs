//! # labops-lifecycle — Lifecycle Governance State Machines
//!
//! The state machines that govern pickup requests, route stops, and
//! routes. The status sets and transition tables are fixed and known at
//! compile time — this is deliberately not a workflow engine.
//!
//! ## Layers
//!
//! - **`status`** — the three status vocabularies and their static
//!   allowed-next tables, unified under the [`LifecycleStatus`] trait.
//! - **`requirements`** — per-target-status required fields and named
//!   validation rules.
//! - **`machine`** — the pure transition decision function. No side
//!   effects, no storage; the caller commits the result.
//! - **`pickup` / `route`** — the entity records that apply accepted
//!   decisions and keep an ordered status history.
//!
//! ## Design
//!
//! Validation is entirely side-effect-free until a decision is accepted,
//! so a rejection at any step leaves no partial state. Rejections carry
//! structured variants (`InvalidTransition`, `MissingRequiredField`,
//! `ValidationFailed`) so callers branch on kind, not on message text.

pub mod machine;
pub mod pickup;
pub mod requirements;
pub mod route;
pub mod status;

pub use machine::{StateMachine, TransitionDecision, TransitionError};
pub use pickup::{PickupRequest, StatusChange};
pub use requirements::{FieldName, TransitionFields, TransitionRequirements, ValidationRule};
pub use route::{Route, RouteError, RouteMetrics, RouteStop, StopType};
pub use status::{EntityKind, LifecycleStatus, PickupRequestStatus, RouteStatus, StopStatus};
