//! # Inbound Events
//!
//! Pickup requests arrive from two external systems: the practice CRM
//! (trusted, same platform) and external EHR integrations (webhook with
//! an HMAC signature). EHR payloads are not deserialized into domain
//! types until their signature has been accepted.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use labops_core::{CaseId, ClinicId, LabId, PackageSpecs, TimeWindow};

use crate::envelope::EventEnvelope;
use crate::signature::{self, SignatureError};

/// Event type for CRM-originated pickup requests.
pub const CRM_PICKUP_REQUESTED: &str = "crm.pickup.requested";
/// Event type for EHR-originated pickup requests.
pub const EHR_PICKUP_REQUESTED: &str = "ehr.pickup.requested";

/// A pickup request raised from the practice CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmPickupRequested {
    /// The lab the pickup is for.
    pub lab_id: LabId,
    /// The clinic requesting the pickup.
    pub clinic_id: ClinicId,
    /// The requested pickup window.
    #[serde(flatten)]
    pub window: TimeWindow,
    /// What is being picked up.
    pub package_specs: PackageSpecs,
    /// Cases the pickup carries.
    #[serde(default)]
    pub associated_case_ids: Vec<CaseId>,
}

/// A pickup request raised from an external EHR integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EhrPickupRequested {
    /// Which external system sent the request ("dentrix", "opendental").
    pub external_system: String,
    /// The lab the pickup is for.
    pub lab_id: LabId,
    /// The clinic requesting the pickup.
    pub clinic_id: ClinicId,
    /// Opaque patient reference in the external system.
    pub patient_ref: String,
    /// The case the request is linked to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<CaseId>,
    /// The requested pickup window.
    #[serde(flatten)]
    pub window: TimeWindow,
}

/// Webhook ingestion failures.
#[derive(Error, Debug)]
pub enum InboundError {
    /// The HMAC signature was rejected.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The payload failed to parse after signature acceptance.
    #[error("inbound payload malformed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Verify and parse an EHR webhook body.
///
/// The signature covers the raw body bytes and is checked in constant
/// time before any parsing happens. Rejections are logged as
/// security-relevant events.
pub fn parse_ehr_webhook(
    secret: &[u8],
    body: &[u8],
    signature_hex: &str,
) -> Result<EventEnvelope<EhrPickupRequested>, InboundError> {
    if let Err(err) = signature::verify(secret, body, signature_hex) {
        warn!(error = %err, "rejected ehr webhook with bad signature");
        return Err(err.into());
    }
    let envelope = serde_json::from_slice(body)?;
    Ok(envelope)
}
