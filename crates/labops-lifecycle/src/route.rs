//! # Route and Route Stop Records
//!
//! The route entity with its ordered stop list and the route-level
//! invariants: stop sequence numbers are unique within a route, a route
//! may start only while at least one stop is pending, and it may complete
//! only once every stop is completed or skipped. Completed stops are
//! immutable except for audit annotations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use labops_core::{
    Coordinates, DriverId, LabId, ProofOfService, RouteId, StopId, Timestamp, VehicleId,
};

use crate::machine::{StateMachine, TransitionDecision, TransitionError};
use crate::pickup::StatusChange;
use crate::requirements::TransitionFields;
use crate::status::{RouteStatus, StopStatus};

/// Whether a stop picks up from a clinic or delivers back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopType {
    /// Collect cases from the clinic.
    Pickup,
    /// Deliver finished cases to the clinic.
    Delivery,
}

/// Errors raised by route-level operations.
#[derive(Error, Debug)]
pub enum RouteError {
    /// A stop with this sequence number already exists on the route.
    #[error("duplicate stop sequence {sequence} on route {route_id}")]
    DuplicateSequence {
        /// The route involved.
        route_id: RouteId,
        /// The colliding sequence number.
        sequence: u32,
    },

    /// The referenced stop is not on this route.
    #[error("stop {stop_id} is not on route {route_id}")]
    UnknownStop {
        /// The route involved.
        route_id: RouteId,
        /// The missing stop.
        stop_id: StopId,
    },

    /// The underlying status transition was rejected.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

// ─── Route Stop ──────────────────────────────────────────────────────

/// A single stop on a courier route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    /// The route this stop belongs to.
    pub route_id: RouteId,
    /// Unique stop identifier.
    pub stop_id: StopId,
    /// Position within the route; unique per route.
    pub sequence: u32,
    /// Pickup or delivery.
    pub stop_type: StopType,
    /// Current status.
    pub status: StopStatus,
    /// Registered location of the stop.
    pub location: Option<Coordinates>,
    /// When the driver actually arrived.
    pub actual_arrival: Option<Timestamp>,
    /// When the service was performed.
    pub completed_at: Option<Timestamp>,
    /// Proof captured at completion.
    pub proof: Option<ProofOfService>,
    /// Audit annotations; the only mutation allowed after completion.
    pub annotations: Vec<String>,
    /// Ordered status history.
    pub history: Vec<StatusChange<StopStatus>>,
}

impl RouteStop {
    /// Create a new pending stop.
    pub fn new(
        route_id: RouteId,
        sequence: u32,
        stop_type: StopType,
        location: Option<Coordinates>,
    ) -> Self {
        Self {
            route_id,
            stop_id: StopId::new(),
            sequence,
            stop_type,
            status: StopStatus::Pending,
            location,
            actual_arrival: None,
            completed_at: None,
            proof: None,
            annotations: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Apply a validated transition against an explicit clock.
    ///
    /// The stop's recorded arrival time backs the
    /// "completedAt must be >= actualArrival" rule when the payload does
    /// not carry one itself.
    pub fn apply_at(
        &mut self,
        requested: StopStatus,
        fields: &TransitionFields,
        now: Timestamp,
    ) -> Result<TransitionDecision<StopStatus>, TransitionError> {
        let mut effective = fields.clone();
        if effective.actual_arrival.is_none() {
            effective.actual_arrival = self.actual_arrival;
        }

        let decision = StateMachine::transition_at(self.status, requested, &effective, now)?;

        match requested {
            StopStatus::Arrived => {
                self.actual_arrival = effective.actual_arrival;
            }
            StopStatus::Completed => {
                self.completed_at = effective.completed_at;
                self.proof = effective.proof.clone();
            }
            _ => {}
        }

        self.history.push(StatusChange {
            from: decision.from,
            to: decision.to,
            at: now,
            reason: fields.reason.clone(),
        });
        self.status = requested;
        Ok(decision)
    }

    /// Append an audit annotation. Permitted in any status, including
    /// the terminal ones.
    pub fn annotate(&mut self, note: impl Into<String>) {
        self.annotations.push(note.into());
    }
}

// ─── Route ───────────────────────────────────────────────────────────

/// Aggregate counters over a route's stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    /// Total number of stops.
    pub total_stops: usize,
    /// Stops completed with proof.
    pub completed_stops: usize,
    /// Stops abandoned.
    pub skipped_stops: usize,
}

/// A courier route: an ordered stop list under one driver and vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Unique identifier.
    pub id: RouteId,
    /// Owning lab (tenant boundary).
    pub lab_id: LabId,
    /// Current status.
    pub status: RouteStatus,
    /// Assigned driver.
    pub driver_id: Option<DriverId>,
    /// Assigned vehicle.
    pub vehicle_id: Option<VehicleId>,
    /// Stops ordered by sequence.
    pub stops: Vec<RouteStop>,
    /// Optimistic-lock version, starting at 0.
    pub version: u64,
    /// When the route was scheduled.
    pub created_at: Timestamp,
    /// Ordered status history.
    pub history: Vec<StatusChange<RouteStatus>>,
}

impl Route {
    /// Create a new route in `Scheduled` with no stops.
    pub fn new(lab_id: LabId) -> Self {
        Self {
            id: RouteId::new(),
            lab_id,
            status: RouteStatus::Scheduled,
            driver_id: None,
            vehicle_id: None,
            stops: Vec::new(),
            version: 0,
            created_at: Timestamp::now(),
            history: Vec::new(),
        }
    }

    /// Add a stop, enforcing sequence uniqueness. Stops are kept ordered
    /// by sequence regardless of insertion order.
    pub fn add_stop(&mut self, stop: RouteStop) -> Result<(), RouteError> {
        if self.stops.iter().any(|s| s.sequence == stop.sequence) {
            return Err(RouteError::DuplicateSequence {
                route_id: self.id,
                sequence: stop.sequence,
            });
        }
        self.stops.push(stop);
        self.stops.sort_by_key(|s| s.sequence);
        Ok(())
    }

    /// Mutable access to a stop by id.
    pub fn stop_mut(&mut self, stop_id: StopId) -> Result<&mut RouteStop, RouteError> {
        let route_id = self.id;
        self.stops
            .iter_mut()
            .find(|s| s.stop_id == stop_id)
            .ok_or(RouteError::UnknownStop { route_id, stop_id })
    }

    /// Apply a route-level transition against an explicit clock.
    ///
    /// The stop-status summary backing the route gates is taken from the
    /// route's own stops — callers never supply it.
    pub fn apply_at(
        &mut self,
        requested: RouteStatus,
        fields: &TransitionFields,
        now: Timestamp,
    ) -> Result<TransitionDecision<RouteStatus>, TransitionError> {
        let mut effective = fields.clone();
        effective.stop_statuses = Some(self.stops.iter().map(|s| s.status).collect());

        let decision = StateMachine::transition_at(self.status, requested, &effective, now)?;

        self.history.push(StatusChange {
            from: decision.from,
            to: decision.to,
            at: now,
            reason: fields.reason.clone(),
        });
        self.status = requested;
        Ok(decision)
    }

    /// Current aggregate counters.
    pub fn metrics(&self) -> RouteMetrics {
        RouteMetrics {
            total_stops: self.stops.len(),
            completed_stops: self
                .stops
                .iter()
                .filter(|s| s.status == StopStatus::Completed)
                .count(),
            skipped_stops: self
                .stops
                .iter()
                .filter(|s| s.status == StopStatus::Skipped)
                .count(),
        }
    }
}

impl labops_tenancy::Versioned for Route {
    fn entity_id(&self) -> String {
        self.id.to_string()
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl labops_tenancy::TenantScoped for Route {
    fn lab_id(&self) -> LabId {
        self.lab_id
    }
}
