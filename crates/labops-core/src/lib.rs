//! # labops-core — Foundational Types for the LabOps Governance Layer
//!
//! The leaf crate of the workspace. Defines the primitives every other
//! crate builds on: identifier newtypes, the UTC-only `Timestamp`, the
//! shared case/logistics records, and the structured error taxonomy for
//! the governance layer.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain identifiers.** `LabId`, `CaseId`,
//!    `RouteId`, `StopId`, … — all newtypes over UUIDs. You cannot pass a
//!    `StopId` where a `RouteId` is expected, and tenant identifiers are
//!    never bare strings.
//!
//! 2. **UTC-only timestamps.** Every timestamp in the governance layer is
//!    UTC with seconds precision and renders as `YYYY-MM-DDTHH:MM:SSZ`,
//!    the wire format of the boundary events.
//!
//! 3. **Structured errors.** Rejections carry tagged variants with the
//!    entity, field, or rule involved so callers branch on error kind,
//!    never on message text.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `labops-*` crates (leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`, and implement
//!   `Serialize`/`Deserialize` where they cross a boundary.

pub mod case;
pub mod error;
pub mod identity;
pub mod temporal;

pub use case::{
    Case, Coordinates, FulfillmentMethod, PackageSpecs, ProofOfService, SlaMetrics, TimeWindow,
};
pub use error::GovernanceError;
pub use identity::{
    CaseId, ClinicId, CorrelationId, DriverId, EventId, LabId, PickupRequestId, RouteId, StopId,
    UserId, VehicleId,
};
pub use temporal::Timestamp;
