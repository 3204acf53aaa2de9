//! # Shared Case and Logistics Records
//!
//! Records used across the lifecycle, custody, and event crates:
//! the version-controlled `Case`, pickup time windows, package specs,
//! proof-of-service, and SLA metrics.
//!
//! ## Versioning Invariant
//!
//! `Case` carries an explicit integer `version`, starting at 0. Every
//! update request must supply the version it read; the store rejects any
//! write whose expected version does not match, and an accepted write
//! increments the version by exactly 1. The optimistic-lock check itself
//! lives in `labops-tenancy`.

use serde::{Deserialize, Serialize};

use crate::identity::{CaseId, ClinicId, LabId};
use crate::temporal::Timestamp;

/// A WGS-84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, [-180, 180].
    pub lng: f64,
}

/// A pickup or delivery time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    #[serde(rename = "windowStart")]
    pub start: Timestamp,
    /// End of the window (inclusive).
    #[serde(rename = "windowEnd")]
    pub end: Timestamp,
}

impl TimeWindow {
    /// Whether the window is well-formed (start strictly before end).
    pub fn is_ordered(&self) -> bool {
        self.start < self.end
    }

    /// Whether the window lies entirely in the future of `now`.
    pub fn is_future(&self, now: Timestamp) -> bool {
        self.start > now
    }
}

/// Physical package characteristics for a pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpecs {
    /// Number of physical packages.
    pub package_count: u32,
    /// Whether the contents are fragile (impressions, ceramics).
    pub fragile: bool,
    /// Whether the contents require temperature control.
    pub temperature_controlled: bool,
    /// Free-form handling notes from the clinic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Proof that a physical handoff was performed.
///
/// At least one of `signature` or `verification_code` is present on any
/// proof accepted for stop completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOfService {
    /// Captured signature reference (opaque handle into the file store).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Captured photo reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// The 6-digit handoff verification code presented at the door.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    /// Name of the person who received the package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub received_by: Option<String>,
}

impl ProofOfService {
    /// Whether this proof is sufficient to complete a stop.
    pub fn is_sufficient(&self) -> bool {
        self.signature.is_some() || self.verification_code.is_some()
    }
}

/// How a delivery was fulfilled, for billing attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentMethod {
    /// Delivered by the lab's own courier fleet.
    InternalCourier,
    /// Delivered by a contracted third-party provider.
    ExternalProvider,
}

/// Service-level metrics for a pickup or delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaMetrics {
    /// Whether the action landed inside its committed window.
    pub sla_met: bool,
    /// Signed variance in minutes; negative means early.
    pub variance_minutes: i64,
}

impl SlaMetrics {
    /// Compute SLA metrics for an action performed at `actual` against a
    /// committed window. Variance is measured from the window end when
    /// late, from the window start when early, and is 0 inside the window.
    pub fn measure(window: &TimeWindow, actual: Timestamp) -> Self {
        if actual > window.end {
            Self {
                sla_met: false,
                variance_minutes: actual.minutes_since(window.end),
            }
        } else if actual < window.start {
            Self {
                sla_met: true,
                variance_minutes: actual.minutes_since(window.start),
            }
        } else {
            Self {
                sla_met: true,
                variance_minutes: 0,
            }
        }
    }
}

/// A lab case — the physical work item whose custody this layer proves.
///
/// Version-controlled: see the module docs for the optimistic-locking
/// invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    /// Unique case identifier.
    pub id: CaseId,
    /// Owning lab (tenant boundary).
    pub lab_id: LabId,
    /// Clinic the case belongs to.
    pub clinic_id: ClinicId,
    /// Opaque patient reference (no PHI in this layer).
    pub patient_ref: String,
    /// Optimistic-lock version, starting at 0.
    pub version: u64,
    /// When the case record was created.
    pub created_at: Timestamp,
}

impl Case {
    /// Create a new case at version 0.
    pub fn new(lab_id: LabId, clinic_id: ClinicId, patient_ref: impl Into<String>) -> Self {
        Self {
            id: CaseId::new(),
            lab_id,
            clinic_id,
            patient_ref: patient_ref.into(),
            version: 0,
            created_at: Timestamp::now(),
        }
    }
}
