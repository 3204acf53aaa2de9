//! # Pickup Request Record
//!
//! The pickup request entity with its validated transition path and
//! status history. All mutation flows through [`PickupRequest::apply_at`],
//! which consults the state machine first and only then copies the
//! accepted fields onto the record.

use serde::{Deserialize, Serialize};

use labops_core::{
    ClinicId, DriverId, LabId, PackageSpecs, PickupRequestId, RouteId, SlaMetrics, TimeWindow,
    Timestamp,
};

use crate::machine::{StateMachine, TransitionDecision, TransitionError};
use crate::requirements::TransitionFields;
use crate::status::PickupRequestStatus;

/// One entry in an entity's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    /// Status before the change.
    pub from: S,
    /// Status after the change.
    pub to: S,
    /// When the change was accepted.
    pub at: Timestamp,
    /// Reason supplied with exception transitions.
    pub reason: Option<String>,
}

/// A clinic pickup request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequest {
    /// Unique identifier.
    pub id: PickupRequestId,
    /// Owning lab (tenant boundary).
    pub lab_id: LabId,
    /// Requesting clinic.
    pub clinic_id: ClinicId,
    /// Committed pickup window.
    pub window: TimeWindow,
    /// Current status.
    pub status: PickupRequestStatus,
    /// Assigned driver, set on Assigned.
    pub assigned_driver: Option<DriverId>,
    /// Assigned route, set on Assigned.
    pub route_id: Option<RouteId>,
    /// Package characteristics.
    pub package_specs: PackageSpecs,
    /// Handoff verification code, set on Completed.
    pub verification_code: Option<String>,
    /// SLA measurement, set on Arrived.
    pub sla: Option<SlaMetrics>,
    /// Optimistic-lock version, starting at 0.
    pub version: u64,
    /// When the request was raised.
    pub created_at: Timestamp,
    /// Ordered status history.
    pub history: Vec<StatusChange<PickupRequestStatus>>,
}

impl PickupRequest {
    /// Create a new request in `Pending`.
    pub fn new(
        lab_id: LabId,
        clinic_id: ClinicId,
        window: TimeWindow,
        package_specs: PackageSpecs,
    ) -> Self {
        Self {
            id: PickupRequestId::new(),
            lab_id,
            clinic_id,
            window,
            status: PickupRequestStatus::Pending,
            assigned_driver: None,
            route_id: None,
            package_specs,
            verification_code: None,
            sla: None,
            version: 0,
            created_at: Timestamp::now(),
            history: Vec::new(),
        }
    }

    /// Apply a validated transition using the current wall clock.
    pub fn apply(
        &mut self,
        requested: PickupRequestStatus,
        fields: &TransitionFields,
    ) -> Result<TransitionDecision<PickupRequestStatus>, TransitionError> {
        self.apply_at(requested, fields, Timestamp::now())
    }

    /// Apply a validated transition against an explicit clock.
    ///
    /// On acceptance the record absorbs the payload fields appropriate to
    /// the new status; on rejection the record is untouched.
    pub fn apply_at(
        &mut self,
        requested: PickupRequestStatus,
        fields: &TransitionFields,
        now: Timestamp,
    ) -> Result<TransitionDecision<PickupRequestStatus>, TransitionError> {
        let decision = StateMachine::transition_at(self.status, requested, fields, now)?;

        match requested {
            PickupRequestStatus::Assigned => {
                self.assigned_driver = fields.assigned_driver;
                self.route_id = fields.route_id;
            }
            PickupRequestStatus::Arrived => {
                if let Some(arrival) = fields.actual_arrival {
                    self.sla = Some(SlaMetrics::measure(&self.window, arrival));
                }
            }
            PickupRequestStatus::Completed => {
                self.verification_code = fields.verification_code.clone();
            }
            PickupRequestStatus::Rescheduled => {
                if let (Some(start), Some(end)) = (fields.window_start, fields.window_end) {
                    self.window = TimeWindow { start, end };
                }
                // A reschedule dissolves the previous assignment.
                self.assigned_driver = None;
                self.route_id = None;
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
}

impl labops_tenancy::Versioned for PickupRequest {
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

impl labops_tenancy::TenantScoped for PickupRequest {
    fn lab_id(&self) -> LabId {
        self.lab_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn now() -> Timestamp {
        ts("2026-03-01T08:00:00Z")
    }

    fn specs() -> PackageSpecs {
        PackageSpecs {
            package_count: 2,
            fragile: true,
            temperature_controlled: false,
            notes: None,
        }
    }

    fn make_request() -> PickupRequest {
        PickupRequest::new(
            LabId::new(),
            ClinicId::new(),
            TimeWindow {
                start: ts("2026-03-01T09:00:00Z"),
                end: ts("2026-03-01T11:00:00Z"),
            },
            specs(),
        )
    }

    fn assigned_fields() -> TransitionFields {
        TransitionFields {
            assigned_driver: Some(DriverId::new()),
            route_id: Some(RouteId::new()),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_request_is_pending() {
        let req = make_request();
        assert_eq!(req.status, PickupRequestStatus::Pending);
        assert!(req.history.is_empty());
    }

    #[test]
    fn test_assignment_absorbs_driver_and_route() {
        let mut req = make_request();
        let fields = assigned_fields();
        req.apply_at(PickupRequestStatus::Assigned, &fields, now()).unwrap();
        assert_eq!(req.assigned_driver, fields.assigned_driver);
        assert_eq!(req.route_id, fields.route_id);
        assert_eq!(req.history.len(), 1);
    }

    #[test]
    fn test_rejected_transition_leaves_record_untouched() {
        let mut req = make_request();
        let before = req.clone();
        let err = req.apply_at(
            PickupRequestStatus::Completed,
            &TransitionFields::default(),
            now(),
        );
        assert!(err.is_err());
        assert_eq!(req.status, before.status);
        assert_eq!(req.history.len(), 0);
    }

    #[test]
    fn test_arrival_measures_sla() {
        let mut req = make_request();
        req.apply_at(PickupRequestStatus::Assigned, &assigned_fields(), now())
            .unwrap();
        req.apply_at(
            PickupRequestStatus::EnRoute,
            &TransitionFields::default(),
            now(),
        )
        .unwrap();
        let fields = TransitionFields {
            actual_arrival: Some(ts("2026-03-01T11:30:00Z")),
            ..Default::default()
        };
        req.apply_at(PickupRequestStatus::Arrived, &fields, now()).unwrap();
        let sla = req.sla.unwrap();
        assert!(!sla.sla_met);
        assert_eq!(sla.variance_minutes, 30);
    }

    #[test]
    fn test_reschedule_clears_assignment_and_moves_window() {
        let mut req = make_request();
        req.apply_at(PickupRequestStatus::Assigned, &assigned_fields(), now())
            .unwrap();
        let fields = TransitionFields {
            window_start: Some(ts("2026-03-03T09:00:00Z")),
            window_end: Some(ts("2026-03-03T11:00:00Z")),
            reason: Some("clinic requested new slot".into()),
            ..Default::default()
        };
        req.apply_at(PickupRequestStatus::Rescheduled, &fields, now())
            .unwrap();
        assert!(req.assigned_driver.is_none());
        assert!(req.route_id.is_none());
        assert_eq!(req.window.start, ts("2026-03-03T09:00:00Z"));
        assert_eq!(
            req.history.last().unwrap().reason.as_deref(),
            Some("clinic requested new slot")
        );
    }

    #[test]
    fn test_full_happy_path_to_completed() {
        let mut req = make_request();
        req.apply_at(PickupRequestStatus::Assigned, &assigned_fields(), now())
            .unwrap();
        req.apply_at(
            PickupRequestStatus::EnRoute,
            &TransitionFields::default(),
            now(),
        )
        .unwrap();
        req.apply_at(
            PickupRequestStatus::Arrived,
            &TransitionFields {
                actual_arrival: Some(ts("2026-03-01T09:40:00Z")),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        req.apply_at(
            PickupRequestStatus::Completed,
            &TransitionFields {
                completed_at: Some(ts("2026-03-01T09:45:00Z")),
                verification_code: Some("812204".into()),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(req.status, PickupRequestStatus::Completed);
        assert_eq!(req.verification_code.as_deref(), Some("812204"));
        assert_eq!(req.history.len(), 4);

        // Terminal: nothing further is accepted.
        assert!(req
            .apply_at(
                PickupRequestStatus::Cancelled,
                &TransitionFields {
                    reason: Some("too late".into()),
                    ..Default::default()
                },
                now(),
            )
            .is_err());
    }
}
