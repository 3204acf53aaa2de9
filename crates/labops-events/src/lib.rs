//! # labops-events
//!
//! Boundary events for the LabOps logistics stack: the shared envelope
//! shape, inbound pickup-request payloads with webhook signature
//! verification, and outbound status/delivery notifications.
//!
//! ## Trust Model
//!
//! CRM events originate inside the platform and are trusted as-is.
//! EHR webhooks cross a trust boundary: their HMAC-SHA256 signature is
//! verified in constant time against a shared secret before the body
//! is parsed.

pub mod envelope;
pub mod inbound;
pub mod outbound;
pub mod signature;

pub use envelope::{EventEnvelope, EventMetadata, SCHEMA_VERSION};
pub use inbound::{
    parse_ehr_webhook, CrmPickupRequested, EhrPickupRequested, InboundError,
    CRM_PICKUP_REQUESTED, EHR_PICKUP_REQUESTED,
};
pub use outbound::{
    CaseDeliveryCompleted, CostBreakdown, LogisticsDeliveryCompleted, PickupStatusChanged,
    RouteStopStatusChanged, CASE_DELIVERY_COMPLETED, LOGISTICS_DELIVERY_COMPLETED,
    PICKUP_STATUS_CHANGED, ROUTE_STOP_STATUS_CHANGED,
};
pub use signature::{sign, verify, SignatureError};
