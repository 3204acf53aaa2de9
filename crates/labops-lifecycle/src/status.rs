//! # Status Vocabularies and Transition Tables
//!
//! The three fixed status sets of the logistics domain and their
//! allowed-next-state tables. The tables are static data baked into
//! `allowed_next()` — this is not a workflow engine, and the state sets
//! are known at compile time.
//!
//! ## Pickup Request
//!
//! ```text
//! Pending ──▶ Assigned ──▶ EnRoute ──▶ Arrived ──▶ Completed (terminal)
//!    │            │           │           │
//!    │            │           └──▶ Skipped◀┘
//!    │            │                  │
//!    │            └──▶ Rescheduled ◀─┘
//!    │                    │    │
//!    └──▶ Cancelled ◀─────┘    └──▶ Pending (re-queued)
//!         (terminal)
//! ```
//!
//! ## Route Stop
//!
//! ```text
//! Pending ──▶ InProgress ──▶ Arrived ──▶ Completed (terminal)
//!    │            │            │
//!    └────────────┴────────────┴──▶ Skipped (terminal)
//! ```
//!
//! ## Route
//!
//! ```text
//! Scheduled ──▶ InProgress ──▶ Completed (terminal)
//!     │             │
//!     └─────────────┴──▶ Cancelled (terminal)
//! ```
//!
//! ## Design Decision
//!
//! Enums with a validated `transition()` path rather than typestate
//! types: three entity kinds with 17 states between them would need 17
//! zero-sized types for no proportional safety gain, and the requested
//! state arrives as request data anyway, so the check is inherently a
//! runtime decision. Transitions are strictly progressive or to an
//! explicit exception status (Rescheduled, Skipped, Cancelled); a status
//! is never listed as its own successor.

use serde::{Deserialize, Serialize};

use crate::requirements::TransitionRequirements;

/// The entity kinds governed by the lifecycle layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A clinic pickup request.
    PickupRequest,
    /// A single stop on a courier route.
    RouteStop,
    /// A courier route.
    Route,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PickupRequest => "PickupRequest",
            Self::RouteStop => "RouteStop",
            Self::Route => "Route",
        };
        f.write_str(s)
    }
}

/// Common surface of the three status vocabularies.
///
/// `allowed_next()` is the transition table; a terminal status has an
/// empty table and therefore rejects every transition, including a
/// resubmission of itself.
pub trait LifecycleStatus:
    Copy + Eq + std::fmt::Debug + std::fmt::Display + Sized + 'static
{
    /// The entity kind this vocabulary belongs to.
    const ENTITY: EntityKind;

    /// Statuses reachable from this one. Empty for terminal statuses.
    fn allowed_next(&self) -> &'static [Self];

    /// Field and rule requirements to enter `target`.
    fn requirements(target: Self) -> &'static TransitionRequirements;

    /// The wire name of the status (matches the serde rendering).
    fn name(&self) -> &'static str;

    /// Whether this status has no outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Whether `target` is in this status's allowed-next set.
    fn allows(&self, target: Self) -> bool {
        self.allowed_next().contains(&target)
    }
}

// ─── Pickup Request ──────────────────────────────────────────────────

/// Status of a pickup request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupRequestStatus {
    /// Raised by a clinic or ingested from CRM/EHR, not yet assigned.
    Pending,
    /// Assigned to a driver and route.
    Assigned,
    /// Driver is on the way.
    EnRoute,
    /// Driver is at the clinic.
    Arrived,
    /// Pickup performed and verified (terminal).
    Completed,
    /// Driver could not perform the pickup.
    Skipped,
    /// Re-queued with a new time window.
    Rescheduled,
    /// Withdrawn by the clinic or the lab (terminal).
    Cancelled,
}

impl LifecycleStatus for PickupRequestStatus {
    const ENTITY: EntityKind = EntityKind::PickupRequest;

    fn allowed_next(&self) -> &'static [Self] {
        use PickupRequestStatus::*;
        match self {
            Pending => &[Assigned, Cancelled],
            Assigned => &[EnRoute, Rescheduled, Cancelled],
            EnRoute => &[Arrived, Skipped],
            Arrived => &[Completed, Skipped],
            Skipped => &[Rescheduled],
            Rescheduled => &[Pending, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    fn requirements(target: Self) -> &'static TransitionRequirements {
        crate::requirements::pickup_requirements(target)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Assigned => "Assigned",
            Self::EnRoute => "EnRoute",
            Self::Arrived => "Arrived",
            Self::Completed => "Completed",
            Self::Skipped => "Skipped",
            Self::Rescheduled => "Rescheduled",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for PickupRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Route Stop ──────────────────────────────────────────────────────

/// Status of a route stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopStatus {
    /// Not yet started.
    Pending,
    /// Driver is heading to this stop.
    InProgress,
    /// Driver is at the stop location.
    Arrived,
    /// Service performed with proof captured (terminal).
    Completed,
    /// Stop abandoned for this route (terminal).
    Skipped,
}

impl LifecycleStatus for StopStatus {
    const ENTITY: EntityKind = EntityKind::RouteStop;

    fn allowed_next(&self) -> &'static [Self] {
        use StopStatus::*;
        match self {
            Pending => &[InProgress, Skipped],
            InProgress => &[Arrived, Skipped],
            Arrived => &[Completed, Skipped],
            Completed | Skipped => &[],
        }
    }

    fn requirements(target: Self) -> &'static TransitionRequirements {
        crate::requirements::stop_requirements(target)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Arrived => "Arrived",
            Self::Completed => "Completed",
            Self::Skipped => "Skipped",
        }
    }
}

impl std::fmt::Display for StopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Route ───────────────────────────────────────────────────────────

/// Status of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStatus {
    /// Planned with an ordered stop list.
    Scheduled,
    /// Driver is executing the route.
    InProgress,
    /// Every stop closed out (terminal).
    Completed,
    /// Abandoned before completion (terminal).
    Cancelled,
}

impl LifecycleStatus for RouteStatus {
    const ENTITY: EntityKind = EntityKind::Route;

    fn allowed_next(&self) -> &'static [Self] {
        use RouteStatus::*;
        match self {
            Scheduled => &[InProgress, Cancelled],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    fn requirements(target: Self) -> &'static TransitionRequirements {
        crate::requirements::route_requirements(target)
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::InProgress => "InProgress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_terminal_statuses() {
        assert!(PickupRequestStatus::Completed.is_terminal());
        assert!(PickupRequestStatus::Cancelled.is_terminal());
        assert!(!PickupRequestStatus::Skipped.is_terminal());
        assert!(!PickupRequestStatus::Rescheduled.is_terminal());
    }

    #[test]
    fn test_stop_terminal_statuses() {
        assert!(StopStatus::Completed.is_terminal());
        assert!(StopStatus::Skipped.is_terminal());
        assert!(!StopStatus::Arrived.is_terminal());
    }

    #[test]
    fn test_route_terminal_statuses() {
        assert!(RouteStatus::Completed.is_terminal());
        assert!(RouteStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_no_status_allows_itself() {
        let pickups = [
            PickupRequestStatus::Pending,
            PickupRequestStatus::Assigned,
            PickupRequestStatus::EnRoute,
            PickupRequestStatus::Arrived,
            PickupRequestStatus::Completed,
            PickupRequestStatus::Skipped,
            PickupRequestStatus::Rescheduled,
            PickupRequestStatus::Cancelled,
        ];
        for s in pickups {
            assert!(!s.allows(s), "{s} lists itself as a successor");
        }
        let stops = [
            StopStatus::Pending,
            StopStatus::InProgress,
            StopStatus::Arrived,
            StopStatus::Completed,
            StopStatus::Skipped,
        ];
        for s in stops {
            assert!(!s.allows(s), "{s} lists itself as a successor");
        }
        let routes = [
            RouteStatus::Scheduled,
            RouteStatus::InProgress,
            RouteStatus::Completed,
            RouteStatus::Cancelled,
        ];
        for s in routes {
            assert!(!s.allows(s), "{s} lists itself as a successor");
        }
    }

    #[test]
    fn test_pickup_pending_cannot_jump_to_completed() {
        assert!(!PickupRequestStatus::Pending.allows(PickupRequestStatus::Completed));
    }

    #[test]
    fn test_rescheduled_requeues_as_pending() {
        assert!(PickupRequestStatus::Rescheduled.allows(PickupRequestStatus::Pending));
        assert!(!PickupRequestStatus::Rescheduled.allows(PickupRequestStatus::Assigned));
    }

    #[test]
    fn test_status_serde_uses_wire_names() {
        let json = serde_json::to_string(&PickupRequestStatus::EnRoute).unwrap();
        assert_eq!(json, "\"EnRoute\"");
        let parsed: StopStatus = serde_json::from_str("\"InProgress\"").unwrap();
        assert_eq!(parsed, StopStatus::InProgress);
    }
}
