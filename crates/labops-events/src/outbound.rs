//! # Outbound Events
//!
//! Notifications the governance layer emits after accepted transitions.
//! Payloads carry the field-exact wire names downstream consumers (case
//! management, billing, clinic portal) already parse.

use serde::{Deserialize, Serialize};

use labops_core::{
    CaseId, DriverId, FulfillmentMethod, PickupRequestId, ProofOfService, RouteId, StopId,
};

/// Event type for completed case deliveries.
pub const CASE_DELIVERY_COMPLETED: &str = "case.delivery.completed";
/// Event type for completed logistics deliveries (billing view).
pub const LOGISTICS_DELIVERY_COMPLETED: &str = "logistics.delivery.completed";
/// Event type for pickup request status changes.
pub const PICKUP_STATUS_CHANGED: &str = "logistics.pickup.status_changed";
/// Event type for route stop status changes.
pub const ROUTE_STOP_STATUS_CHANGED: &str = "logistics.route_stop.status_changed";

/// A case reached its clinic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDeliveryCompleted {
    /// The delivered case.
    pub case_id: CaseId,
    /// The route that carried it.
    pub route_id: RouteId,
    /// The stop where it was handed off.
    pub stop_id: StopId,
    /// Proof captured at the door.
    pub proof_of_service: ProofOfService,
    /// Whether the delivery landed inside its committed window.
    pub sla_met: bool,
    /// Signed variance in minutes; negative means early.
    pub variance_minutes: i64,
}

/// Per-delivery cost breakdown for billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    /// Flat fee per delivery, in cents.
    pub base_fee_cents: u64,
    /// Distance-derived fee, in cents.
    pub distance_fee_cents: u64,
    /// Surcharges (fragile handling, after-hours), in cents.
    #[serde(default)]
    pub surcharge_cents: u64,
    /// ISO 4217 currency code.
    pub currency: String,
}

impl CostBreakdown {
    /// Total cost in cents.
    pub fn total_cents(&self) -> u64 {
        self.base_fee_cents + self.distance_fee_cents + self.surcharge_cents
    }
}

/// A delivery completed, from the billing side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogisticsDeliveryCompleted {
    /// The delivered case.
    pub case_id: CaseId,
    /// How the delivery was fulfilled.
    pub fulfillment_method: FulfillmentMethod,
    /// Cost breakdown for invoicing.
    pub cost: CostBreakdown,
    /// Proof captured at the door.
    pub proof_of_service: ProofOfService,
}

/// A pickup request changed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupStatusChanged {
    /// The affected pickup request.
    pub pickup_request_id: PickupRequestId,
    /// Status before the transition, by wire name.
    pub previous_status: String,
    /// Status after the transition, by wire name.
    pub new_status: String,
    /// The assigned driver, once one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_driver: Option<DriverId>,
    /// The assigned route, once one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<RouteId>,
    /// Operator-supplied reason, for cancellations and reschedules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A route stop changed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStopStatusChanged {
    /// The route the stop belongs to.
    pub route_id: RouteId,
    /// The affected stop.
    pub stop_id: StopId,
    /// Status before the transition, by wire name.
    pub previous_status: String,
    /// Status after the transition, by wire name.
    pub new_status: String,
    /// Operator-supplied reason, for skips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
