//! # Transition Decision Function
//!
//! Validates a requested status transition against the static transition
//! table and the requirements registered for the target status. Pure:
//! this module never mutates an entity or touches storage — the caller
//! persists the result, which is what makes mid-validation failure
//! naturally safe (abort before commit, nothing to roll back).
//!
//! Rejection order: table lookup first (`InvalidTransition`, which also
//! covers terminal statuses and self-transitions), then field presence
//! (`MissingRequiredField`), then named rules (`ValidationFailed`).

use thiserror::Error;

use labops_core::Timestamp;

use crate::requirements::TransitionFields;
use crate::status::{EntityKind, LifecycleStatus};

/// Why a transition was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The requested status is not in the allowed-next set.
    #[error("invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        /// The entity kind being transitioned.
        entity: EntityKind,
        /// Current status wire name.
        from: &'static str,
        /// Requested status wire name.
        to: &'static str,
    },

    /// A field required by the target status is absent.
    #[error("missing required field: {field}")]
    MissingRequiredField {
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// A named validation predicate failed.
    #[error("validation failed: {rule}")]
    ValidationFailed {
        /// The failed rule's wire message.
        rule: &'static str,
    },
}

/// An accepted transition, ready for the caller to commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionDecision<S: LifecycleStatus> {
    /// Status before the transition.
    pub from: S,
    /// Status after the transition.
    pub to: S,
    /// Wire messages of the rules that were evaluated and passed.
    pub checked_rules: Vec<&'static str>,
}

/// The lifecycle state machine.
///
/// Stateless — both entry points are associated functions over any
/// [`LifecycleStatus`] vocabulary.
pub struct StateMachine;

impl StateMachine {
    /// Validate a transition using the current wall clock.
    pub fn transition<S: LifecycleStatus>(
        current: S,
        requested: S,
        fields: &TransitionFields,
    ) -> Result<TransitionDecision<S>, TransitionError> {
        Self::transition_at(current, requested, fields, Timestamp::now())
    }

    /// Validate a transition against an explicit clock.
    ///
    /// `now` feeds time-sensitive rules ("new window must be in the
    /// future") without making the decision depend on ambient state.
    pub fn transition_at<S: LifecycleStatus>(
        current: S,
        requested: S,
        fields: &TransitionFields,
        now: Timestamp,
    ) -> Result<TransitionDecision<S>, TransitionError> {
        if !current.allows(requested) {
            return Err(TransitionError::InvalidTransition {
                entity: S::ENTITY,
                from: current.name(),
                to: requested.name(),
            });
        }

        let reqs = S::requirements(requested);
        for field in reqs.required {
            if !fields.has(*field) {
                return Err(TransitionError::MissingRequiredField {
                    field: field.as_str(),
                });
            }
        }
        for rule in reqs.rules {
            if !rule.evaluate(fields, now) {
                return Err(TransitionError::ValidationFailed {
                    rule: rule.message(),
                });
            }
        }

        Ok(TransitionDecision {
            from: current,
            to: requested,
            checked_rules: reqs.rules.iter().map(|r| r.message()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{PickupRequestStatus, RouteStatus, StopStatus};
    use labops_core::{DriverId, ProofOfService, RouteId};

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn now() -> Timestamp {
        ts("2026-03-01T08:00:00Z")
    }

    // ── Table enforcement ────────────────────────────────────────────

    #[test]
    fn test_pending_to_completed_rejected() {
        // Skipping Assigned/EnRoute/Arrived is not a shortcut the table offers.
        let err = StateMachine::transition_at(
            PickupRequestStatus::Pending,
            PickupRequestStatus::Completed,
            &TransitionFields::default(),
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                entity: crate::status::EntityKind::PickupRequest,
                from: "Pending",
                to: "Completed",
            }
        );
    }

    #[test]
    fn test_terminal_rejects_everything_including_self() {
        for requested in [
            PickupRequestStatus::Pending,
            PickupRequestStatus::Assigned,
            PickupRequestStatus::Completed,
            PickupRequestStatus::Cancelled,
        ] {
            let result = StateMachine::transition_at(
                PickupRequestStatus::Completed,
                requested,
                &TransitionFields::default(),
                now(),
            );
            assert!(matches!(
                result,
                Err(TransitionError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn test_self_transition_rejected_on_nonterminal() {
        let result = StateMachine::transition_at(
            StopStatus::Arrived,
            StopStatus::Arrived,
            &TransitionFields::default(),
            now(),
        );
        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_all_untabled_pairs_rejected() {
        let all = [
            StopStatus::Pending,
            StopStatus::InProgress,
            StopStatus::Arrived,
            StopStatus::Completed,
            StopStatus::Skipped,
        ];
        for current in all {
            for requested in all {
                if current.allows(requested) {
                    continue;
                }
                let result = StateMachine::transition_at(
                    current,
                    requested,
                    &TransitionFields::default(),
                    now(),
                );
                assert!(
                    matches!(result, Err(TransitionError::InvalidTransition { .. })),
                    "{current} -> {requested} should be InvalidTransition"
                );
            }
        }
    }

    // ── Field requirements ───────────────────────────────────────────

    #[test]
    fn test_assignment_requires_driver_and_route() {
        let err = StateMachine::transition_at(
            PickupRequestStatus::Pending,
            PickupRequestStatus::Assigned,
            &TransitionFields::default(),
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::MissingRequiredField {
                field: "assignedDriver"
            }
        );

        let partial = TransitionFields {
            assigned_driver: Some(DriverId::new()),
            ..Default::default()
        };
        let err = StateMachine::transition_at(
            PickupRequestStatus::Pending,
            PickupRequestStatus::Assigned,
            &partial,
            now(),
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::MissingRequiredField { field: "routeId" });
    }

    #[test]
    fn test_assignment_accepted_with_fields() {
        let fields = TransitionFields {
            assigned_driver: Some(DriverId::new()),
            route_id: Some(RouteId::new()),
            ..Default::default()
        };
        let decision = StateMachine::transition_at(
            PickupRequestStatus::Pending,
            PickupRequestStatus::Assigned,
            &fields,
            now(),
        )
        .unwrap();
        assert_eq!(decision.from, PickupRequestStatus::Pending);
        assert_eq!(decision.to, PickupRequestStatus::Assigned);
    }

    // ── Rule evaluation ──────────────────────────────────────────────

    #[test]
    fn test_stop_completion_before_arrival_rejected() {
        let fields = TransitionFields {
            actual_arrival: Some(ts("2026-03-01T10:30:00Z")),
            completed_at: Some(ts("2026-03-01T10:00:00Z")),
            proof: Some(ProofOfService {
                signature: Some("sig-1".into()),
                photo: None,
                verification_code: None,
                received_by: None,
            }),
            ..Default::default()
        };
        let err = StateMachine::transition_at(
            StopStatus::Arrived,
            StopStatus::Completed,
            &fields,
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ValidationFailed {
                rule: "completedAt must be >= actualArrival"
            }
        );
    }

    #[test]
    fn test_stop_completion_accepted_with_proof() {
        let fields = TransitionFields {
            actual_arrival: Some(ts("2026-03-01T10:30:00Z")),
            completed_at: Some(ts("2026-03-01T10:40:00Z")),
            proof: Some(ProofOfService {
                signature: None,
                photo: None,
                verification_code: Some("042917".into()),
                received_by: Some("Reception".into()),
            }),
            ..Default::default()
        };
        let decision = StateMachine::transition_at(
            StopStatus::Arrived,
            StopStatus::Completed,
            &fields,
            now(),
        )
        .unwrap();
        assert!(decision
            .checked_rules
            .contains(&"completedAt must be >= actualArrival"));
    }

    #[test]
    fn test_reschedule_window_must_be_future_and_ordered() {
        let inverted = TransitionFields {
            window_start: Some(ts("2026-03-02T11:00:00Z")),
            window_end: Some(ts("2026-03-02T09:00:00Z")),
            ..Default::default()
        };
        let err = StateMachine::transition_at(
            PickupRequestStatus::Assigned,
            PickupRequestStatus::Rescheduled,
            &inverted,
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ValidationFailed {
                rule: "windowStart must be before windowEnd"
            }
        );

        let past = TransitionFields {
            window_start: Some(ts("2026-02-20T09:00:00Z")),
            window_end: Some(ts("2026-02-20T11:00:00Z")),
            ..Default::default()
        };
        let err = StateMachine::transition_at(
            PickupRequestStatus::Assigned,
            PickupRequestStatus::Rescheduled,
            &past,
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ValidationFailed {
                rule: "new window must be in the future"
            }
        );
    }

    // ── Route gates ──────────────────────────────────────────────────

    #[test]
    fn test_route_start_requires_pending_stop() {
        let no_pending = TransitionFields {
            stop_statuses: Some(vec![StopStatus::Completed, StopStatus::Skipped]),
            ..Default::default()
        };
        let err = StateMachine::transition_at(
            RouteStatus::Scheduled,
            RouteStatus::InProgress,
            &no_pending,
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ValidationFailed {
                rule: "route requires at least one pending stop"
            }
        );
    }

    #[test]
    fn test_route_completion_requires_all_stops_closed() {
        let open = TransitionFields {
            stop_statuses: Some(vec![StopStatus::Completed, StopStatus::Arrived]),
            ..Default::default()
        };
        let err = StateMachine::transition_at(
            RouteStatus::InProgress,
            RouteStatus::Completed,
            &open,
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TransitionError::ValidationFailed {
                rule: "all stops must be completed or skipped"
            }
        );

        let closed = TransitionFields {
            stop_statuses: Some(vec![StopStatus::Completed, StopStatus::Skipped]),
            ..Default::default()
        };
        assert!(StateMachine::transition_at(
            RouteStatus::InProgress,
            RouteStatus::Completed,
            &closed,
            now(),
        )
        .is_ok());
    }
}
