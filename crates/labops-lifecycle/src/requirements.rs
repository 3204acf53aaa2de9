//! # Transition Requirements
//!
//! Per-target-state field and validation requirements, consulted by the
//! state machine before a transition is accepted. The tables are static:
//! each target status maps to the request fields that must be present and
//! the named predicates that must hold.
//!
//! Rule messages are the wire messages of the platform — callers surface
//! them verbatim so a driver app can tell the user exactly which input
//! to fix.

use labops_core::{DriverId, ProofOfService, RouteId, Timestamp};

use crate::status::StopStatus;

// ─── Field Names ─────────────────────────────────────────────────────

/// The request fields a transition may require, in the wire casing of
/// the platform's mutation payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldName {
    /// `assignedDriver` — the driver taking the pickup.
    AssignedDriver,
    /// `routeId` — the route the pickup was placed on.
    RouteId,
    /// `actualArrival` — when the driver arrived.
    ActualArrival,
    /// `completedAt` — when the service was performed.
    CompletedAt,
    /// `verificationCode` — the 6-digit handoff code.
    VerificationCode,
    /// `windowStart` — new window start for a reschedule.
    WindowStart,
    /// `windowEnd` — new window end for a reschedule.
    WindowEnd,
    /// `reason` — why a stop/pickup/route was abandoned.
    Reason,
    /// `stopStatuses` — status summary of a route's stops.
    StopStatuses,
    /// `proofOfService` — signature/photo/code bundle.
    ProofOfService,
}

impl FieldName {
    /// The wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssignedDriver => "assignedDriver",
            Self::RouteId => "routeId",
            Self::ActualArrival => "actualArrival",
            Self::CompletedAt => "completedAt",
            Self::VerificationCode => "verificationCode",
            Self::WindowStart => "windowStart",
            Self::WindowEnd => "windowEnd",
            Self::Reason => "reason",
            Self::StopStatuses => "stopStatuses",
            Self::ProofOfService => "proofOfService",
        }
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Transition Fields ───────────────────────────────────────────────

/// The optional payload accompanying a transition request.
///
/// Mirrors the mutation payloads of the platform: every field is
/// optional here, and the requirements table decides which must be
/// present for a given target status.
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    /// Driver assignment.
    pub assigned_driver: Option<DriverId>,
    /// Route assignment.
    pub route_id: Option<RouteId>,
    /// Actual arrival time.
    pub actual_arrival: Option<Timestamp>,
    /// Completion time.
    pub completed_at: Option<Timestamp>,
    /// Handoff verification code.
    pub verification_code: Option<String>,
    /// New window start (reschedule).
    pub window_start: Option<Timestamp>,
    /// New window end (reschedule).
    pub window_end: Option<Timestamp>,
    /// Reason for an exception transition.
    pub reason: Option<String>,
    /// Status summary of a route's stops, for route-level gates.
    pub stop_statuses: Option<Vec<StopStatus>>,
    /// Proof-of-service bundle.
    pub proof: Option<ProofOfService>,
}

impl TransitionFields {
    /// Whether the named field is present.
    pub fn has(&self, field: FieldName) -> bool {
        match field {
            FieldName::AssignedDriver => self.assigned_driver.is_some(),
            FieldName::RouteId => self.route_id.is_some(),
            FieldName::ActualArrival => self.actual_arrival.is_some(),
            FieldName::CompletedAt => self.completed_at.is_some(),
            FieldName::VerificationCode => self.verification_code.is_some(),
            FieldName::WindowStart => self.window_start.is_some(),
            FieldName::WindowEnd => self.window_end.is_some(),
            FieldName::Reason => self.reason.is_some(),
            FieldName::StopStatuses => self.stop_statuses.is_some(),
            FieldName::ProofOfService => self.proof.is_some(),
        }
    }
}

// ─── Validation Rules ────────────────────────────────────────────────

/// Named validation predicates evaluated against [`TransitionFields`].
///
/// Each rule vacuously passes when the fields it inspects are absent;
/// presence is the requirements table's job, not the rule's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// Reschedule windows must be ordered.
    WindowOrdered,
    /// Reschedule windows must lie in the future.
    WindowInFuture,
    /// Completion cannot predate arrival.
    CompletedAfterArrival,
    /// Proof of service must carry a signature or a verification code.
    ProofSufficient,
    /// A route may start only with at least one pending stop.
    RouteHasPendingStop,
    /// A route may complete only when every stop is closed out.
    AllStopsClosed,
}

impl ValidationRule {
    /// The wire message surfaced when the rule fails.
    pub fn message(&self) -> &'static str {
        match self {
            Self::WindowOrdered => "windowStart must be before windowEnd",
            Self::WindowInFuture => "new window must be in the future",
            Self::CompletedAfterArrival => "completedAt must be >= actualArrival",
            Self::ProofSufficient => "proof of service requires a signature or verification code",
            Self::RouteHasPendingStop => "route requires at least one pending stop",
            Self::AllStopsClosed => "all stops must be completed or skipped",
        }
    }

    /// Evaluate the rule. `now` is supplied by the caller so the decision
    /// stays a pure function of its inputs.
    pub fn evaluate(&self, fields: &TransitionFields, now: Timestamp) -> bool {
        match self {
            Self::WindowOrdered => match (fields.window_start, fields.window_end) {
                (Some(start), Some(end)) => start < end,
                _ => true,
            },
            Self::WindowInFuture => fields.window_start.map_or(true, |start| start > now),
            Self::CompletedAfterArrival => {
                match (fields.completed_at, fields.actual_arrival) {
                    (Some(completed), Some(arrival)) => completed >= arrival,
                    _ => true,
                }
            }
            Self::ProofSufficient => fields.proof.as_ref().map_or(true, ProofOfService::is_sufficient),
            Self::RouteHasPendingStop => fields
                .stop_statuses
                .as_ref()
                .map_or(true, |stops| stops.iter().any(|s| *s == StopStatus::Pending)),
            Self::AllStopsClosed => fields.stop_statuses.as_ref().map_or(true, |stops| {
                stops
                    .iter()
                    .all(|s| matches!(s, StopStatus::Completed | StopStatus::Skipped))
            }),
        }
    }
}

// ─── Requirements Table ──────────────────────────────────────────────

/// The requirements registered for one target status.
#[derive(Debug)]
pub struct TransitionRequirements {
    /// Fields that must be present in the transition payload.
    pub required: &'static [FieldName],
    /// Predicates that must hold over the payload.
    pub rules: &'static [ValidationRule],
}

static NONE: TransitionRequirements = TransitionRequirements {
    required: &[],
    rules: &[],
};

static REASON_ONLY: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::Reason],
    rules: &[],
};

static PICKUP_ASSIGNED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::AssignedDriver, FieldName::RouteId],
    rules: &[],
};

static PICKUP_ARRIVED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::ActualArrival],
    rules: &[],
};

static PICKUP_COMPLETED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::CompletedAt, FieldName::VerificationCode],
    rules: &[ValidationRule::CompletedAfterArrival],
};

static PICKUP_RESCHEDULED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::WindowStart, FieldName::WindowEnd],
    rules: &[ValidationRule::WindowOrdered, ValidationRule::WindowInFuture],
};

static STOP_ARRIVED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::ActualArrival],
    rules: &[],
};

static STOP_COMPLETED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::CompletedAt, FieldName::ProofOfService],
    rules: &[
        ValidationRule::CompletedAfterArrival,
        ValidationRule::ProofSufficient,
    ],
};

static ROUTE_STARTED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::StopStatuses],
    rules: &[ValidationRule::RouteHasPendingStop],
};

static ROUTE_COMPLETED: TransitionRequirements = TransitionRequirements {
    required: &[FieldName::StopStatuses],
    rules: &[ValidationRule::AllStopsClosed],
};

pub(crate) fn pickup_requirements(
    target: crate::status::PickupRequestStatus,
) -> &'static TransitionRequirements {
    use crate::status::PickupRequestStatus::*;
    match target {
        Assigned => &PICKUP_ASSIGNED,
        Arrived => &PICKUP_ARRIVED,
        Completed => &PICKUP_COMPLETED,
        Rescheduled => &PICKUP_RESCHEDULED,
        Skipped | Cancelled => &REASON_ONLY,
        Pending | EnRoute => &NONE,
    }
}

pub(crate) fn stop_requirements(target: StopStatus) -> &'static TransitionRequirements {
    use StopStatus::*;
    match target {
        Arrived => &STOP_ARRIVED,
        Completed => &STOP_COMPLETED,
        Skipped => &REASON_ONLY,
        Pending | InProgress => &NONE,
    }
}

pub(crate) fn route_requirements(
    target: crate::status::RouteStatus,
) -> &'static TransitionRequirements {
    use crate::status::RouteStatus::*;
    match target {
        InProgress => &ROUTE_STARTED,
        Completed => &ROUTE_COMPLETED,
        Cancelled => &REASON_ONLY,
        Scheduled => &NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    #[test]
    fn test_has_tracks_presence() {
        let mut fields = TransitionFields::default();
        assert!(!fields.has(FieldName::Reason));
        fields.reason = Some("clinic closed".into());
        assert!(fields.has(FieldName::Reason));
    }

    #[test]
    fn test_window_ordered_rule() {
        let now = ts("2026-03-01T08:00:00Z");
        let fields = TransitionFields {
            window_start: Some(ts("2026-03-02T11:00:00Z")),
            window_end: Some(ts("2026-03-02T09:00:00Z")),
            ..Default::default()
        };
        assert!(!ValidationRule::WindowOrdered.evaluate(&fields, now));
    }

    #[test]
    fn test_window_future_rule() {
        let now = ts("2026-03-01T08:00:00Z");
        let past = TransitionFields {
            window_start: Some(ts("2026-02-28T09:00:00Z")),
            window_end: Some(ts("2026-02-28T11:00:00Z")),
            ..Default::default()
        };
        assert!(!ValidationRule::WindowInFuture.evaluate(&past, now));
        let future = TransitionFields {
            window_start: Some(ts("2026-03-02T09:00:00Z")),
            window_end: Some(ts("2026-03-02T11:00:00Z")),
            ..Default::default()
        };
        assert!(ValidationRule::WindowInFuture.evaluate(&future, now));
    }

    #[test]
    fn test_completed_after_arrival_rule() {
        let now = ts("2026-03-01T12:00:00Z");
        let fields = TransitionFields {
            actual_arrival: Some(ts("2026-03-01T10:30:00Z")),
            completed_at: Some(ts("2026-03-01T10:15:00Z")),
            ..Default::default()
        };
        assert!(!ValidationRule::CompletedAfterArrival.evaluate(&fields, now));
        let equal = TransitionFields {
            actual_arrival: Some(ts("2026-03-01T10:30:00Z")),
            completed_at: Some(ts("2026-03-01T10:30:00Z")),
            ..Default::default()
        };
        assert!(ValidationRule::CompletedAfterArrival.evaluate(&equal, now));
    }

    #[test]
    fn test_route_gates() {
        use crate::status::StopStatus::*;
        let now = Timestamp::now();
        let open = TransitionFields {
            stop_statuses: Some(vec![Pending, Completed]),
            ..Default::default()
        };
        assert!(ValidationRule::RouteHasPendingStop.evaluate(&open, now));
        assert!(!ValidationRule::AllStopsClosed.evaluate(&open, now));

        let closed = TransitionFields {
            stop_statuses: Some(vec![Completed, Skipped]),
            ..Default::default()
        };
        assert!(!ValidationRule::RouteHasPendingStop.evaluate(&closed, now));
        assert!(ValidationRule::AllStopsClosed.evaluate(&closed, now));
    }

    #[test]
    fn test_rule_messages_are_wire_exact() {
        assert_eq!(
            ValidationRule::CompletedAfterArrival.message(),
            "completedAt must be >= actualArrival"
        );
        assert_eq!(
            ValidationRule::WindowOrdered.message(),
            "windowStart must be before windowEnd"
        );
    }
}
