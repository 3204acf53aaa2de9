//! # Chain-of-Custody Ledger
//!
//! Append-only record of physical handoff events for lab cases. Events
//! are immutable once recorded — a correction is a new `Exception` event,
//! never an edit.
//!
//! ## Chain Completeness
//!
//! A case's chain is complete when it holds at least one `LabDeparture`
//! and one `ClinicArrival`. `verify_chain` additionally reports any
//! adjacent pair recorded out of chronological order and any event
//! lacking verification metadata.
//!
//! ## Location Leniency
//!
//! An out-of-tolerance delivery location does not block recording: the
//! check result is logged and the caller records a flagged event.
//! Clinics' registered coordinates are not precise enough to gate
//! physical handoff on, so the failure is surfaced for audit review
//! instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use labops_core::{CaseId, Coordinates, EventId, Timestamp};

use crate::geo::{self, GeoError, DEFAULT_ARRIVAL_TOLERANCE_METERS, DEFAULT_GEOHASH_PRECISION};
use crate::store::CustodyStore;

// ─── Event Types ─────────────────────────────────────────────────────

/// The custody event vocabulary, in chain order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyEventType {
    /// Case left the lab with a courier.
    LabDeparture,
    /// Intermediate scan while in transit.
    InTransit,
    /// Courier arrived at the clinic.
    ClinicArrival,
    /// Case handed to clinic staff for the patient.
    PatientHandoff,
    /// Out-of-band correction or anomaly record.
    Exception,
}

impl CustodyEventType {
    /// The wire name of the event type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LabDeparture => "LAB_DEPARTURE",
            Self::InTransit => "IN_TRANSIT",
            Self::ClinicArrival => "CLINIC_ARRIVAL",
            Self::PatientHandoff => "PATIENT_HANDOFF",
            Self::Exception => "EXCEPTION",
        }
    }
}

impl std::fmt::Display for CustodyEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Event Payload Types ─────────────────────────────────────────────

/// Where a custody event happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyLocation {
    /// Free-form description ("Lab loading dock", "Clinic reception").
    pub description: String,
    /// Device-reported coordinates, when the capturing device had a fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Verification metadata attached to a custody event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyVerification {
    /// The 6-digit handoff code presented, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Captured signature reference, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Who verified the handoff.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
}

/// An immutable custody event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// The case in custody.
    pub case_id: CaseId,
    /// What happened.
    pub event_type: CustodyEventType,
    /// Who performed or observed the handoff.
    pub actor: String,
    /// Where it happened.
    pub location: CustodyLocation,
    /// Geohash of the location; `None` when the device had no fix.
    /// Events without a geohash cannot back arrival-location validation.
    pub geohash: Option<String>,
    /// Verification metadata; its absence is reported by `verify_chain`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<CustodyVerification>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Flags raised at recording time (e.g. out-of-tolerance location).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    /// When the event was recorded.
    pub recorded_at: Timestamp,
}

/// An unvalidated custody event as received from a capture device or
/// ingestion endpoint. Every field the contract requires is optional
/// here; [`CustodyLedger::record_event`] enforces presence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyEventDraft {
    /// Case identifier.
    pub case_id: Option<CaseId>,
    /// Event type.
    pub event_type: Option<CustodyEventType>,
    /// Acting courier or staff member.
    pub actor: Option<String>,
    /// Capture location.
    pub location: Option<CustodyLocation>,
    /// Verification metadata.
    pub verification: Option<CustodyVerification>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Flags raised by the caller before recording.
    #[serde(default)]
    pub flags: Vec<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised by custody recording.
#[derive(Error, Debug)]
pub enum CustodyError {
    /// A required draft field is absent.
    #[error("missing custody event field: {field}")]
    MissingField {
        /// Wire name of the missing field.
        field: &'static str,
    },

    /// Geohash decoding failed.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The backing store rejected the append.
    #[error("custody store error: {0}")]
    Store(String),
}

// ─── Chain Verification ──────────────────────────────────────────────

/// Result of verifying a case's custody chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    /// Whether the chain holds both required endpoint events.
    pub complete: bool,
    /// Human-readable names of the missing required events.
    pub missing: Vec<String>,
    /// Ordering and verification problems found in the chain.
    pub errors: Vec<String>,
}

/// Verify a custody chain.
///
/// `events` is expected in recorded order (the store's per-case append
/// sequence); chronological inversions between adjacent events are
/// reported as errors rather than silently re-sorted.
pub fn verify_chain(events: &[CustodyEvent]) -> ChainReport {
    let mut missing = Vec::new();
    if !events
        .iter()
        .any(|e| e.event_type == CustodyEventType::LabDeparture)
    {
        missing.push("Lab departure event".to_string());
    }
    if !events
        .iter()
        .any(|e| e.event_type == CustodyEventType::ClinicArrival)
    {
        missing.push("Clinic arrival event".to_string());
    }

    let mut errors = Vec::new();
    for pair in events.windows(2) {
        if pair[1].recorded_at < pair[0].recorded_at {
            errors.push(format!(
                "event {} ({}) recorded before preceding event {} ({})",
                pair[1].id, pair[1].event_type, pair[0].id, pair[0].event_type
            ));
        }
    }
    for event in events {
        if event.verification.is_none() {
            errors.push(format!(
                "event {} ({}) lacks verification metadata",
                event.id, event.event_type
            ));
        }
    }

    ChainReport {
        complete: missing.is_empty(),
        missing,
        errors,
    }
}

// ─── Delivery Location Validation ───────────────────────────────────

/// Result of validating a delivery location against a clinic's
/// registered coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCheck {
    /// Whether the delivery point is within tolerance.
    pub valid: bool,
    /// Measured distance in meters.
    pub distance_meters: f64,
    /// The tolerance applied.
    pub tolerance_meters: f64,
    /// Failure description when invalid.
    pub reason: Option<String>,
}

/// Validate a recorded delivery location against the clinic's registered
/// geohash.
///
/// An invalid result is logged and returned, never swallowed — but it is
/// the caller's decision whether to proceed with a flagged exception
/// event (the platform's default) or to block.
pub fn validate_delivery_location(
    delivery_geohash: &str,
    clinic_geohash: &str,
    tolerance_meters: f64,
) -> Result<LocationCheck, GeoError> {
    let check = geo::within_tolerance(delivery_geohash, clinic_geohash, tolerance_meters)?;
    let reason = if check.valid {
        None
    } else {
        Some(format!(
            "delivery recorded {:.0}m from registered clinic location (tolerance {:.0}m)",
            check.distance_meters, tolerance_meters
        ))
    };
    if let Some(reason) = &reason {
        warn!(
            distance_meters = check.distance_meters,
            tolerance_meters, "delivery location out of tolerance: {reason}"
        );
    }
    Ok(LocationCheck {
        valid: check.valid,
        distance_meters: check.distance_meters,
        tolerance_meters,
        reason,
    })
}

/// Validate a delivery location with the default 100 m tolerance.
pub fn validate_delivery_location_default(
    delivery_geohash: &str,
    clinic_geohash: &str,
) -> Result<LocationCheck, GeoError> {
    validate_delivery_location(
        delivery_geohash,
        clinic_geohash,
        DEFAULT_ARRIVAL_TOLERANCE_METERS,
    )
}

// ─── The Ledger ──────────────────────────────────────────────────────

/// The custody ledger over a backing store.
#[derive(Debug)]
pub struct CustodyLedger<S: CustodyStore> {
    store: S,
}

impl<S: CustodyStore> CustodyLedger<S> {
    /// Create a ledger over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate and record a custody event using the current wall clock.
    pub fn record_event(&self, draft: CustodyEventDraft) -> Result<CustodyEvent, CustodyError> {
        self.record_event_at(draft, Timestamp::now())
    }

    /// Validate and record a custody event with an explicit timestamp.
    ///
    /// Validation is side-effect-free: nothing is appended unless the
    /// draft is complete.
    pub fn record_event_at(
        &self,
        draft: CustodyEventDraft,
        now: Timestamp,
    ) -> Result<CustodyEvent, CustodyError> {
        let case_id = draft
            .case_id
            .ok_or(CustodyError::MissingField { field: "caseId" })?;
        let event_type = draft
            .event_type
            .ok_or(CustodyError::MissingField { field: "eventType" })?;
        let actor = draft
            .actor
            .ok_or(CustodyError::MissingField { field: "actor" })?;
        let location = draft
            .location
            .ok_or(CustodyError::MissingField { field: "location" })?;

        let geohash = location
            .coordinates
            .map(|c| geo::encode(c, DEFAULT_GEOHASH_PRECISION));

        let event = CustodyEvent {
            id: EventId::new(),
            case_id,
            event_type,
            actor,
            location,
            geohash,
            verification: draft.verification,
            notes: draft.notes,
            flags: draft.flags,
            recorded_at: now,
        };
        self.store.append(event.clone())?;
        Ok(event)
    }

    /// All events for a case in append order.
    pub fn events_for_case(&self, case_id: CaseId) -> Vec<CustodyEvent> {
        self.store.events_for_case(case_id)
    }

    /// Verify the recorded chain for a case.
    pub fn verify_case_chain(&self, case_id: CaseId) -> ChainReport {
        verify_chain(&self.store.events_for_case(case_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCustodyStore;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn ledger() -> CustodyLedger<InMemoryCustodyStore> {
        CustodyLedger::new(InMemoryCustodyStore::new())
    }

    fn verification() -> CustodyVerification {
        CustodyVerification {
            code: Some("417233".into()),
            signature: None,
            verified_by: Some("courier-12".into()),
        }
    }

    fn draft(case_id: CaseId, event_type: CustodyEventType) -> CustodyEventDraft {
        CustodyEventDraft {
            case_id: Some(case_id),
            event_type: Some(event_type),
            actor: Some("courier-12".into()),
            location: Some(CustodyLocation {
                description: "Lab loading dock".into(),
                coordinates: Some(Coordinates {
                    lat: 55.6761,
                    lng: 12.5683,
                }),
            }),
            verification: Some(verification()),
            notes: None,
            flags: Vec::new(),
        }
    }

    // ── Recording ────────────────────────────────────────────────────

    #[test]
    fn test_record_event_computes_geohash() {
        let l = ledger();
        let case = CaseId::new();
        let event = l
            .record_event_at(draft(case, CustodyEventType::LabDeparture), ts("2026-03-01T09:00:00Z"))
            .unwrap();
        let hash = event.geohash.unwrap();
        assert_eq!(hash.len(), DEFAULT_GEOHASH_PRECISION);
        assert!(hash.starts_with("u3")); // Copenhagen cell
    }

    #[test]
    fn test_record_event_without_coordinates_has_no_geohash() {
        let l = ledger();
        let mut d = draft(CaseId::new(), CustodyEventType::InTransit);
        d.location = Some(CustodyLocation {
            description: "Van".into(),
            coordinates: None,
        });
        let event = l.record_event_at(d, ts("2026-03-01T09:30:00Z")).unwrap();
        assert!(event.geohash.is_none());
    }

    #[test]
    fn test_record_event_missing_fields() {
        let l = ledger();
        let mut d = draft(CaseId::new(), CustodyEventType::LabDeparture);
        d.actor = None;
        let err = l.record_event(d).unwrap_err();
        assert!(matches!(err, CustodyError::MissingField { field: "actor" }));

        let err = l.record_event(CustodyEventDraft::default()).unwrap_err();
        assert!(matches!(err, CustodyError::MissingField { field: "caseId" }));
    }

    #[test]
    fn test_missing_fields_leave_store_untouched() {
        let l = ledger();
        let case = CaseId::new();
        let mut d = draft(case, CustodyEventType::LabDeparture);
        d.location = None;
        let _ = l.record_event(d);
        assert!(l.events_for_case(case).is_empty());
    }

    #[test]
    fn test_event_wire_shape() {
        let l = ledger();
        let event = l
            .record_event_at(
                draft(CaseId::new(), CustodyEventType::LabDeparture),
                ts("2026-03-01T09:00:00Z"),
            )
            .unwrap();

        let json = serde_json::to_value(&event).unwrap();
        // Event types travel as SCREAMING_SNAKE_CASE.
        assert_eq!(json["eventType"], "LAB_DEPARTURE");
        assert_eq!(json["recordedAt"], "2026-03-01T09:00:00Z");

        let back: CustodyEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type, CustodyEventType::LabDeparture);
    }

    // ── Chain verification ───────────────────────────────────────────

    #[test]
    fn test_chain_complete_with_departure_and_arrival() {
        let l = ledger();
        let case = CaseId::new();
        l.record_event_at(draft(case, CustodyEventType::LabDeparture), ts("2026-03-01T09:00:00Z"))
            .unwrap();
        l.record_event_at(draft(case, CustodyEventType::ClinicArrival), ts("2026-03-01T10:00:00Z"))
            .unwrap();
        let report = l.verify_case_chain(case);
        assert!(report.complete);
        assert!(report.missing.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_chain_arrival_without_departure_incomplete() {
        let l = ledger();
        let case = CaseId::new();
        l.record_event_at(draft(case, CustodyEventType::ClinicArrival), ts("2026-03-01T10:00:00Z"))
            .unwrap();
        let report = l.verify_case_chain(case);
        assert!(!report.complete);
        assert_eq!(report.missing, vec!["Lab departure event".to_string()]);
    }

    #[test]
    fn test_chain_reports_out_of_order_events() {
        let l = ledger();
        let case = CaseId::new();
        l.record_event_at(draft(case, CustodyEventType::LabDeparture), ts("2026-03-01T10:00:00Z"))
            .unwrap();
        // Recorded after, timestamped before.
        l.record_event_at(draft(case, CustodyEventType::ClinicArrival), ts("2026-03-01T09:00:00Z"))
            .unwrap();
        let report = l.verify_case_chain(case);
        assert!(report.complete);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("recorded before preceding event"));
    }

    #[test]
    fn test_chain_reports_missing_verification() {
        let l = ledger();
        let case = CaseId::new();
        let mut d = draft(case, CustodyEventType::LabDeparture);
        d.verification = None;
        l.record_event_at(d, ts("2026-03-01T09:00:00Z")).unwrap();
        let report = l.verify_case_chain(case);
        assert!(report.errors.iter().any(|e| e.contains("lacks verification metadata")));
    }

    // ── Delivery location validation ─────────────────────────────────

    #[test]
    fn test_out_of_tolerance_returns_reason_not_error() {
        let clinic = geo::encode(
            Coordinates {
                lat: 55.6761,
                lng: 12.5683,
            },
            9,
        );
        let arrival = geo::encode(
            Coordinates {
                lat: 55.6761 + 0.00135, // ~150m north
                lng: 12.5683,
            },
            9,
        );
        let check = validate_delivery_location_default(&arrival, &clinic).unwrap();
        assert!(!check.valid);
        assert_eq!(check.tolerance_meters, 100.0);
        assert!(check.reason.as_ref().unwrap().contains("tolerance"));
    }

    #[test]
    fn test_event_still_recordable_when_flagged() {
        // The lenient path: an out-of-tolerance check flags the event
        // instead of blocking it.
        let l = ledger();
        let case = CaseId::new();
        let mut d = draft(case, CustodyEventType::Exception);
        d.flags.push("delivery location out of tolerance".into());
        let event = l.record_event_at(d, ts("2026-03-01T10:00:00Z")).unwrap();
        assert_eq!(event.flags.len(), 1);
        assert_eq!(l.events_for_case(case).len(), 1);
    }
}
