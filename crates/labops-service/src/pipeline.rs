//! # Governance Pipeline
//!
//! One entry point per mutation class. Every operation threads an
//! explicit [`TenantContext`] and runs the same gauntlet in the same
//! order:
//!
//! 1. tenant authorization (fail closed),
//! 2. optimistic version check (never auto-merged),
//! 3. the lifecycle state machine (transition table, required fields,
//!    validation rules),
//! 4. commit,
//! 5. custody recording where the operation touches physical handoff,
//! 6. audit append, then outbound event staging.
//!
//! Any failure aborts before commit; validation never mutates state.
//! Access denials and concurrency conflicts are audit-logged before the
//! error is returned, so the trail captures attempts as well as
//! outcomes.

use tracing::debug;

use labops_audit::{AuditEntityKind, AuditRecord, AuditSeverity, AuditTrail};
use labops_core::{
    Case, CaseId, Coordinates, CorrelationId, FulfillmentMethod, PickupRequestId, ProofOfService,
    RouteId, SlaMetrics, StopId, TimeWindow, Timestamp,
};
use labops_custody::{
    generate_verification_code, geo, validate_delivery_location, CustodyError, CustodyEvent,
    CustodyEventDraft, CustodyEventType, CustodyLedger, CustodyLocation, CustodyVerification,
    InMemoryCustodyStore, DEFAULT_ARRIVAL_TOLERANCE_METERS, DEFAULT_GEOHASH_PRECISION,
};
use labops_events::{
    CaseDeliveryCompleted, CostBreakdown, EventEnvelope, LogisticsDeliveryCompleted,
    PickupStatusChanged, RouteStopStatusChanged, CASE_DELIVERY_COMPLETED,
    LOGISTICS_DELIVERY_COMPLETED, PICKUP_STATUS_CHANGED, ROUTE_STOP_STATUS_CHANGED,
};
use labops_lifecycle::{
    LifecycleStatus, PickupRequest, PickupRequestStatus, Route, StopStatus, TransitionFields,
};
use labops_tenancy::{
    authorize, filter_to_tenant, ConcurrencyGuard, InMemoryVersionedStore, TenancyError,
    TenantContext, VersionedStore,
};

use crate::error::ServiceError;
use crate::outbox::{Outbox, OutboundEvent};

/// Event source stamped on everything the pipeline emits.
const EVENT_SOURCE: &str = "labops";

// ─── Operation Payloads ──────────────────────────────────────────────

/// A request to move a pickup request to a new status.
#[derive(Debug, Clone)]
pub struct TransitionPickup {
    /// The pickup request to transition.
    pub pickup_id: PickupRequestId,
    /// The requested target status.
    pub target: PickupRequestStatus,
    /// The version the caller read.
    pub expected_version: u64,
    /// Transition payload fields.
    pub fields: TransitionFields,
}

/// A request to complete a delivery stop.
#[derive(Debug, Clone)]
pub struct CompleteStop {
    /// The route the stop is on.
    pub route_id: RouteId,
    /// The stop being completed.
    pub stop_id: StopId,
    /// The route version the caller read.
    pub expected_version: u64,
    /// The case delivered at this stop, when known.
    pub case_id: Option<CaseId>,
    /// When the service was performed.
    pub completed_at: Timestamp,
    /// Proof captured at the door.
    pub proof: ProofOfService,
    /// Device-reported delivery coordinates.
    pub arrival_location: Option<Coordinates>,
    /// The committed delivery window backing the SLA outcome.
    pub committed_window: Option<TimeWindow>,
    /// How the delivery was fulfilled.
    pub fulfillment_method: FulfillmentMethod,
    /// Cost breakdown for the billing event, when priced.
    pub cost: Option<CostBreakdown>,
}

/// A request to update mutable case fields under version control.
#[derive(Debug, Clone)]
pub struct CaseUpdate {
    /// The case to update.
    pub case_id: CaseId,
    /// The version the caller read.
    pub expected_version: u64,
    /// New patient reference, when changing.
    pub patient_ref: Option<String>,
}

// ─── The Pipeline ────────────────────────────────────────────────────

/// The governance pipeline over in-memory stores.
///
/// Stores are behind traits ([`VersionedStore`], `CustodyStore`); a
/// persistent deployment swaps the implementations without touching
/// the operation logic.
#[derive(Debug)]
pub struct Governance {
    pickups: InMemoryVersionedStore<PickupRequestId, PickupRequest>,
    routes: InMemoryVersionedStore<RouteId, Route>,
    cases: InMemoryVersionedStore<CaseId, Case>,
    ledger: CustodyLedger<InMemoryCustodyStore>,
    audit: AuditTrail,
    outbox: Outbox,
    arrival_tolerance_meters: f64,
}

impl Default for Governance {
    fn default() -> Self {
        Self::new()
    }
}

impl Governance {
    /// Create a pipeline with the default arrival tolerance.
    pub fn new() -> Self {
        Self {
            pickups: InMemoryVersionedStore::new(),
            routes: InMemoryVersionedStore::new(),
            cases: InMemoryVersionedStore::new(),
            ledger: CustodyLedger::new(InMemoryCustodyStore::new()),
            audit: AuditTrail::new(),
            outbox: Outbox::new(),
            arrival_tolerance_meters: DEFAULT_ARRIVAL_TOLERANCE_METERS,
        }
    }

    /// Override the arrival tolerance, in meters.
    pub fn with_arrival_tolerance(mut self, meters: f64) -> Self {
        self.arrival_tolerance_meters = meters;
        self
    }

    /// The audit trail.
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    /// The custody ledger.
    pub fn ledger(&self) -> &CustodyLedger<InMemoryCustodyStore> {
        &self.ledger
    }

    /// The outbound event buffer.
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    // ── Registration & reads ─────────────────────────────────────────

    /// Register a pickup request under the context's tenant.
    pub fn register_pickup(
        &self,
        ctx: &TenantContext,
        request: PickupRequest,
    ) -> Result<(), ServiceError> {
        authorize(ctx, request.lab_id)?;
        self.pickups.insert(request.id, request);
        Ok(())
    }

    /// Register a route under the context's tenant.
    pub fn register_route(&self, ctx: &TenantContext, route: Route) -> Result<(), ServiceError> {
        authorize(ctx, route.lab_id)?;
        self.routes.insert(route.id, route);
        Ok(())
    }

    /// Register a case under the context's tenant.
    pub fn register_case(&self, ctx: &TenantContext, case: Case) -> Result<(), ServiceError> {
        authorize(ctx, case.lab_id)?;
        self.cases.insert(case.id, case);
        Ok(())
    }

    /// All of the tenant's pickup requests.
    pub fn pickups(&self, ctx: &TenantContext) -> Vec<PickupRequest> {
        filter_to_tenant(self.pickups.values(), ctx)
    }

    /// All of the tenant's routes.
    pub fn routes(&self, ctx: &TenantContext) -> Vec<Route> {
        filter_to_tenant(self.routes.values(), ctx)
    }

    /// All of the tenant's cases.
    pub fn cases(&self, ctx: &TenantContext) -> Vec<Case> {
        filter_to_tenant(self.cases.values(), ctx)
    }

    // ── transition_pickup ────────────────────────────────────────────

    /// Transition a pickup request using the current wall clock.
    pub fn transition_pickup(
        &self,
        ctx: &TenantContext,
        request: TransitionPickup,
    ) -> Result<PickupRequest, ServiceError> {
        self.transition_pickup_at(ctx, request, Timestamp::now())
    }

    /// Transition a pickup request against an explicit clock.
    pub fn transition_pickup_at(
        &self,
        ctx: &TenantContext,
        request: TransitionPickup,
        now: Timestamp,
    ) -> Result<PickupRequest, ServiceError> {
        let correlation = CorrelationId::new();
        let entity_id = request.pickup_id.to_string();
        let stored = self
            .pickups
            .get(&request.pickup_id)
            .ok_or(ServiceError::UnknownEntity {
                kind: "pickup request",
                id: entity_id.clone(),
            })?;

        self.check_tenant(
            ctx,
            stored.lab_id,
            AuditEntityKind::PickupRequest,
            &entity_id,
            correlation,
            now,
        )?;
        self.check_version(
            ctx,
            &stored,
            request.expected_version,
            AuditEntityKind::PickupRequest,
            &entity_id,
            correlation,
            now,
        )?;

        let mut updated = stored.clone();
        let decision = match updated.apply_at(request.target, &request.fields, now) {
            Ok(decision) => decision,
            Err(err) => {
                self.audit.append(AuditRecord {
                    timestamp: now,
                    actor: ctx.user_id,
                    lab_id: ctx.lab_id,
                    entity_kind: AuditEntityKind::PickupRequest,
                    entity_id,
                    action: "transition.rejected".into(),
                    previous_status: Some(stored.status.name().to_string()),
                    new_status: Some(request.target.name().to_string()),
                    severity: AuditSeverity::Info,
                    correlation_id: correlation,
                    detail: Some(err.to_string()),
                });
                return Err(err.into());
            }
        };

        self.pickups
            .update(&request.pickup_id, updated.clone(), request.expected_version)
            .map_err(|err| {
                self.audit_conflict(
                    ctx,
                    AuditEntityKind::PickupRequest,
                    &entity_id,
                    correlation,
                    now,
                    &err,
                );
                err
            })?;
        let updated = self
            .pickups
            .get(&request.pickup_id)
            .ok_or(ServiceError::UnknownEntity {
                kind: "pickup request",
                id: entity_id.clone(),
            })?;

        self.audit.append(AuditRecord {
            timestamp: now,
            actor: ctx.user_id,
            lab_id: ctx.lab_id,
            entity_kind: AuditEntityKind::PickupRequest,
            entity_id,
            action: "transition".into(),
            previous_status: Some(decision.from.name().to_string()),
            new_status: Some(decision.to.name().to_string()),
            severity: AuditSeverity::Info,
            correlation_id: correlation,
            detail: None,
        });

        self.outbox.push(OutboundEvent::PickupStatusChanged(
            EventEnvelope::new_at(
                PICKUP_STATUS_CHANGED,
                EVENT_SOURCE,
                PickupStatusChanged {
                    pickup_request_id: updated.id,
                    previous_status: decision.from.name().to_string(),
                    new_status: decision.to.name().to_string(),
                    assigned_driver: updated.assigned_driver,
                    route_id: updated.route_id,
                    reason: request.fields.reason.clone(),
                },
                now,
            )
            .with_correlation(correlation),
        ));

        debug!(pickup = %updated.id, from = decision.from.name(), to = decision.to.name(), "pickup transitioned");
        Ok(updated)
    }

    // ── complete_stop ────────────────────────────────────────────────

    /// Complete a delivery stop using the current wall clock.
    pub fn complete_stop(
        &self,
        ctx: &TenantContext,
        request: CompleteStop,
    ) -> Result<Route, ServiceError> {
        self.complete_stop_at(ctx, request, Timestamp::now())
    }

    /// Complete a delivery stop against an explicit clock.
    ///
    /// Runs the stop state machine, records the custody handoff, and
    /// validates the delivery location. An out-of-tolerance location is
    /// flagged (Exception custody event, stop annotation, Security audit
    /// record) but never blocks the completion.
    pub fn complete_stop_at(
        &self,
        ctx: &TenantContext,
        request: CompleteStop,
        now: Timestamp,
    ) -> Result<Route, ServiceError> {
        let correlation = CorrelationId::new();
        let stop_entity_id = request.stop_id.to_string();
        let stored = self
            .routes
            .get(&request.route_id)
            .ok_or(ServiceError::UnknownEntity {
                kind: "route",
                id: request.route_id.to_string(),
            })?;

        self.check_tenant(
            ctx,
            stored.lab_id,
            AuditEntityKind::RouteStop,
            &stop_entity_id,
            correlation,
            now,
        )?;
        self.check_version(
            ctx,
            &stored,
            request.expected_version,
            AuditEntityKind::Route,
            &stored.id.to_string(),
            correlation,
            now,
        )?;

        let mut route = stored.clone();
        let (previous_status, registered_location) = {
            let stop = route.stop_mut(request.stop_id)?;
            (stop.status, stop.location)
        };

        // Location check first: its outcome only flags, never blocks.
        let location_flag = match (request.arrival_location, registered_location) {
            (Some(arrival), Some(registered)) => {
                let check = validate_delivery_location(
                    &geo::encode(arrival, DEFAULT_GEOHASH_PRECISION),
                    &geo::encode(registered, DEFAULT_GEOHASH_PRECISION),
                    self.arrival_tolerance_meters,
                )
                .map_err(CustodyError::from)?;
                check.reason
            }
            _ => None,
        };

        let fields = TransitionFields {
            completed_at: Some(request.completed_at),
            proof: Some(request.proof.clone()),
            ..Default::default()
        };
        let decision = {
            let stop = route.stop_mut(request.stop_id)?;
            match stop.apply_at(StopStatus::Completed, &fields, now) {
                Ok(decision) => decision,
                Err(err) => {
                    self.audit.append(AuditRecord {
                        timestamp: now,
                        actor: ctx.user_id,
                        lab_id: ctx.lab_id,
                        entity_kind: AuditEntityKind::RouteStop,
                        entity_id: stop_entity_id,
                        action: "transition.rejected".into(),
                        previous_status: Some(previous_status.name().to_string()),
                        new_status: Some(StopStatus::Completed.name().to_string()),
                        severity: AuditSeverity::Info,
                        correlation_id: correlation,
                        detail: Some(err.to_string()),
                    });
                    return Err(err.into());
                }
            }
        };

        if let Some(flag) = &location_flag {
            let stop = route.stop_mut(request.stop_id)?;
            stop.annotate(flag.clone());
        }

        // Custody chain: arrival, then handoff if someone received it.
        // Drafts are staged here and appended to the ledger only after
        // the route commit succeeds; a losing concurrent write must not
        // leave custody events for a completion that never happened.
        let mut custody_drafts = Vec::new();
        if let Some(case_id) = request.case_id {
            let verification = CustodyVerification {
                code: request.proof.verification_code.clone(),
                signature: request.proof.signature.clone(),
                verified_by: request.proof.received_by.clone(),
            };
            let location = CustodyLocation {
                description: "Clinic delivery stop".into(),
                coordinates: request.arrival_location,
            };
            let mut flags = Vec::new();
            if let Some(flag) = &location_flag {
                flags.push(flag.clone());
            }
            custody_drafts.push(CustodyEventDraft {
                case_id: Some(case_id),
                event_type: Some(CustodyEventType::ClinicArrival),
                actor: Some(ctx.user_id.to_string()),
                location: Some(location.clone()),
                verification: Some(verification.clone()),
                notes: None,
                flags: flags.clone(),
            });
            if request.proof.received_by.is_some() {
                custody_drafts.push(CustodyEventDraft {
                    case_id: Some(case_id),
                    event_type: Some(CustodyEventType::PatientHandoff),
                    actor: Some(ctx.user_id.to_string()),
                    location: Some(location.clone()),
                    verification: Some(verification.clone()),
                    notes: None,
                    flags: Vec::new(),
                });
            }
            if let Some(flag) = &location_flag {
                custody_drafts.push(CustodyEventDraft {
                    case_id: Some(case_id),
                    event_type: Some(CustodyEventType::Exception),
                    actor: Some(ctx.user_id.to_string()),
                    location: Some(location),
                    verification: Some(verification),
                    notes: Some(flag.clone()),
                    flags,
                });
            }
        }

        self.routes
            .update(&request.route_id, route, request.expected_version)
            .map_err(|err| {
                self.audit_conflict(
                    ctx,
                    AuditEntityKind::Route,
                    &request.route_id.to_string(),
                    correlation,
                    now,
                    &err,
                );
                err
            })?;
        let route = self
            .routes
            .get(&request.route_id)
            .ok_or(ServiceError::UnknownEntity {
                kind: "route",
                id: request.route_id.to_string(),
            })?;

        for draft in custody_drafts {
            self.ledger.record_event_at(draft, now)?;
        }

        self.audit.append(AuditRecord {
            timestamp: now,
            actor: ctx.user_id,
            lab_id: ctx.lab_id,
            entity_kind: AuditEntityKind::RouteStop,
            entity_id: request.stop_id.to_string(),
            action: "transition".into(),
            previous_status: Some(decision.from.name().to_string()),
            new_status: Some(decision.to.name().to_string()),
            severity: AuditSeverity::Info,
            correlation_id: correlation,
            detail: None,
        });
        if let Some(flag) = &location_flag {
            self.audit.append(AuditRecord {
                timestamp: now,
                actor: ctx.user_id,
                lab_id: ctx.lab_id,
                entity_kind: AuditEntityKind::RouteStop,
                entity_id: request.stop_id.to_string(),
                action: "location.flagged".into(),
                previous_status: None,
                new_status: None,
                severity: AuditSeverity::Security,
                correlation_id: correlation,
                detail: Some(flag.clone()),
            });
        }

        let stop_event = EventEnvelope::new_at(
            ROUTE_STOP_STATUS_CHANGED,
            EVENT_SOURCE,
            RouteStopStatusChanged {
                route_id: request.route_id,
                stop_id: request.stop_id,
                previous_status: decision.from.name().to_string(),
                new_status: decision.to.name().to_string(),
                reason: None,
            },
            now,
        )
        .with_correlation(correlation);
        // Delivery events are consequences of the stop transition.
        let cause = stop_event.event_id;
        self.outbox
            .push(OutboundEvent::RouteStopStatusChanged(stop_event));

        if let Some(case_id) = request.case_id {
            let sla = request
                .committed_window
                .map(|window| SlaMetrics::measure(&window, request.completed_at))
                .unwrap_or(SlaMetrics {
                    sla_met: true,
                    variance_minutes: 0,
                });
            self.outbox.push(OutboundEvent::CaseDeliveryCompleted(
                EventEnvelope::new_at(
                    CASE_DELIVERY_COMPLETED,
                    EVENT_SOURCE,
                    CaseDeliveryCompleted {
                        case_id,
                        route_id: request.route_id,
                        stop_id: request.stop_id,
                        proof_of_service: request.proof.clone(),
                        sla_met: sla.sla_met,
                        variance_minutes: sla.variance_minutes,
                    },
                    now,
                )
                .with_correlation(correlation)
                .with_causation(cause),
            ));
            if let Some(cost) = request.cost.clone() {
                self.outbox.push(OutboundEvent::LogisticsDeliveryCompleted(
                    EventEnvelope::new_at(
                        LOGISTICS_DELIVERY_COMPLETED,
                        EVENT_SOURCE,
                        LogisticsDeliveryCompleted {
                            case_id,
                            fulfillment_method: request.fulfillment_method,
                            cost,
                            proof_of_service: request.proof.clone(),
                        },
                        now,
                    )
                    .with_correlation(correlation)
                    .with_causation(cause),
                ));
            }
        }

        debug!(stop = %request.stop_id, route = %request.route_id, "stop completed");
        Ok(route)
    }

    // ── record_custody_event ─────────────────────────────────────────

    /// Record a custody event using the current wall clock.
    pub fn record_custody_event(
        &self,
        ctx: &TenantContext,
        draft: CustodyEventDraft,
    ) -> Result<CustodyEvent, ServiceError> {
        self.record_custody_event_at(ctx, draft, Timestamp::now())
    }

    /// Record a custody event against an explicit clock.
    pub fn record_custody_event_at(
        &self,
        ctx: &TenantContext,
        draft: CustodyEventDraft,
        now: Timestamp,
    ) -> Result<CustodyEvent, ServiceError> {
        let correlation = CorrelationId::new();
        let case_id = draft
            .case_id
            .ok_or(CustodyError::MissingField { field: "caseId" })?;
        let case = self.cases.get(&case_id).ok_or(ServiceError::UnknownEntity {
            kind: "case",
            id: case_id.to_string(),
        })?;
        self.check_tenant(
            ctx,
            case.lab_id,
            AuditEntityKind::CustodyEvent,
            &case_id.to_string(),
            correlation,
            now,
        )?;

        let event = self.ledger.record_event_at(draft, now)?;

        self.audit.append(AuditRecord {
            timestamp: now,
            actor: ctx.user_id,
            lab_id: ctx.lab_id,
            entity_kind: AuditEntityKind::CustodyEvent,
            entity_id: event.id.to_string(),
            action: "custody.record".into(),
            previous_status: None,
            new_status: None,
            severity: AuditSeverity::Info,
            correlation_id: correlation,
            detail: Some(event.event_type.name().to_string()),
        });
        Ok(event)
    }

    // ── update_case ──────────────────────────────────────────────────

    /// Update case fields using the current wall clock.
    pub fn update_case(
        &self,
        ctx: &TenantContext,
        update: CaseUpdate,
    ) -> Result<Case, ServiceError> {
        self.update_case_at(ctx, update, Timestamp::now())
    }

    /// Update case fields against an explicit clock.
    pub fn update_case_at(
        &self,
        ctx: &TenantContext,
        update: CaseUpdate,
        now: Timestamp,
    ) -> Result<Case, ServiceError> {
        let correlation = CorrelationId::new();
        let entity_id = update.case_id.to_string();
        let stored = self
            .cases
            .get(&update.case_id)
            .ok_or(ServiceError::UnknownEntity {
                kind: "case",
                id: entity_id.clone(),
            })?;

        self.check_tenant(
            ctx,
            stored.lab_id,
            AuditEntityKind::Case,
            &entity_id,
            correlation,
            now,
        )?;
        self.check_version(
            ctx,
            &stored,
            update.expected_version,
            AuditEntityKind::Case,
            &entity_id,
            correlation,
            now,
        )?;

        let mut updated = stored.clone();
        if let Some(patient_ref) = update.patient_ref {
            updated.patient_ref = patient_ref;
        }
        self.cases
            .update(&update.case_id, updated, update.expected_version)
            .map_err(|err| {
                self.audit_conflict(ctx, AuditEntityKind::Case, &entity_id, correlation, now, &err);
                err
            })?;
        let updated = self
            .cases
            .get(&update.case_id)
            .ok_or(ServiceError::UnknownEntity {
                kind: "case",
                id: entity_id.clone(),
            })?;

        self.audit.append(AuditRecord {
            timestamp: now,
            actor: ctx.user_id,
            lab_id: ctx.lab_id,
            entity_kind: AuditEntityKind::Case,
            entity_id,
            action: "update".into(),
            previous_status: None,
            new_status: None,
            severity: AuditSeverity::Info,
            correlation_id: correlation,
            detail: None,
        });
        Ok(updated)
    }

    // ── issue_verification_code ──────────────────────────────────────

    /// Issue a handoff verification code for a case.
    ///
    /// Codes are deterministic in the case and issuance time, so support
    /// can re-derive one without a lookup table.
    pub fn issue_verification_code_at(
        &self,
        ctx: &TenantContext,
        case_id: CaseId,
        now: Timestamp,
    ) -> Result<String, ServiceError> {
        let correlation = CorrelationId::new();
        let case = self.cases.get(&case_id).ok_or(ServiceError::UnknownEntity {
            kind: "case",
            id: case_id.to_string(),
        })?;
        self.check_tenant(
            ctx,
            case.lab_id,
            AuditEntityKind::Case,
            &case_id.to_string(),
            correlation,
            now,
        )?;
        let code = generate_verification_code(&case_id, now);
        self.audit.append(AuditRecord {
            timestamp: now,
            actor: ctx.user_id,
            lab_id: ctx.lab_id,
            entity_kind: AuditEntityKind::Case,
            entity_id: case_id.to_string(),
            action: "code.issue".into(),
            previous_status: None,
            new_status: None,
            severity: AuditSeverity::Info,
            correlation_id: correlation,
            detail: None,
        });
        Ok(code)
    }

    // ── Shared gauntlet steps ────────────────────────────────────────

    fn check_tenant(
        &self,
        ctx: &TenantContext,
        resource_lab: labops_core::LabId,
        entity_kind: AuditEntityKind,
        entity_id: &str,
        correlation: CorrelationId,
        now: Timestamp,
    ) -> Result<(), TenancyError> {
        authorize(ctx, resource_lab).map_err(|err| {
            self.audit.append(AuditRecord {
                timestamp: now,
                actor: ctx.user_id,
                lab_id: ctx.lab_id,
                entity_kind,
                entity_id: entity_id.to_string(),
                action: "deny".into(),
                previous_status: None,
                new_status: None,
                severity: AuditSeverity::Security,
                correlation_id: correlation,
                detail: Some(err.to_string()),
            });
            err
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn check_version<T: labops_tenancy::Versioned>(
        &self,
        ctx: &TenantContext,
        stored: &T,
        expected_version: u64,
        entity_kind: AuditEntityKind,
        entity_id: &str,
        correlation: CorrelationId,
        now: Timestamp,
    ) -> Result<(), labops_tenancy::ConcurrencyError> {
        ConcurrencyGuard::apply_update(stored, expected_version)
            .map(|_| ())
            .map_err(|err| {
                self.audit_conflict(ctx, entity_kind, entity_id, correlation, now, &err);
                err
            })
    }

    fn audit_conflict(
        &self,
        ctx: &TenantContext,
        entity_kind: AuditEntityKind,
        entity_id: &str,
        correlation: CorrelationId,
        now: Timestamp,
        err: &labops_tenancy::ConcurrencyError,
    ) {
        self.audit.append(AuditRecord {
            timestamp: now,
            actor: ctx.user_id,
            lab_id: ctx.lab_id,
            entity_kind,
            entity_id: entity_id.to_string(),
            action: "write.conflict".into(),
            previous_status: None,
            new_status: None,
            severity: AuditSeverity::Critical,
            correlation_id: correlation,
            detail: Some(err.to_string()),
        });
    }
}
