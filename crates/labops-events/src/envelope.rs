//! # Event Envelope
//!
//! Every message crossing the platform boundary travels in one envelope
//! shape: identity, type, timing, provenance, schema version, optional
//! correlation metadata, and a typed payload. Field names on the wire
//! are camelCase.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use labops_core::{CorrelationId, EventId, Timestamp};

/// Schema version stamped on envelopes this crate produces.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Correlation metadata linking an event to the operation and the
/// event that caused it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    /// The logical operation this event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
    /// The event that directly caused this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<EventId>,
}

/// The boundary envelope around a typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope<T> {
    /// Unique event identifier.
    pub event_id: EventId,
    /// Dotted event type ("logistics.pickup.status_changed").
    pub event_type: String,
    /// When the event was produced.
    pub timestamp: Timestamp,
    /// The producing system ("labops", "crm", "ehr").
    pub source: String,
    /// Payload schema version (semver).
    pub version: String,
    /// Correlation metadata; omitted from the wire when empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
    /// The typed payload.
    pub payload: T,
}

impl<T: Serialize> EventEnvelope<T> {
    /// Wrap a payload in a fresh envelope stamped with the current
    /// schema version and wall clock.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, payload: T) -> Self {
        Self::new_at(event_type, source, payload, Timestamp::now())
    }

    /// Wrap a payload with an explicit timestamp.
    pub fn new_at(
        event_type: impl Into<String>,
        source: impl Into<String>,
        payload: T,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            timestamp,
            source: source.into(),
            version: SCHEMA_VERSION.to_string(),
            metadata: None,
            payload,
        }
    }

    /// Attach a correlation id.
    pub fn with_correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.metadata
            .get_or_insert_with(EventMetadata::default)
            .correlation_id = Some(correlation_id);
        self
    }

    /// Attach the causing event's id.
    pub fn with_causation(mut self, causation_id: EventId) -> Self {
        self.metadata
            .get_or_insert_with(EventMetadata::default)
            .causation_id = Some(causation_id);
        self
    }

    /// Serialize the envelope to its wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> EventEnvelope<T> {
    /// Parse an envelope from its wire form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
