//! # Audit Trail
//!
//! Append-only record of every governance decision: accepted
//! transitions, rejected writes, access denials, custody recordings.
//! Records are never updated or deleted; a correction is a new record
//! referencing the old one via its correlation id.
//!
//! Access denials and concurrency conflicts are appended *before* the
//! error propagates to the caller, so the trail captures attempts, not
//! just outcomes.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use labops_core::{CorrelationId, LabId, Timestamp, UserId};

// ─── Record Vocabulary ───────────────────────────────────────────────

/// How consequential an audit record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuditSeverity {
    /// Routine accepted operation.
    Info,
    /// Security-relevant event (access denial, signature failure).
    Security,
    /// Data-integrity problem (broken custody chain, conflicting write).
    Critical,
}

impl std::fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Info => "Info",
            Self::Security => "Security",
            Self::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// The kind of entity an audit record concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditEntityKind {
    /// A clinic pickup request.
    PickupRequest,
    /// A stop on a courier route.
    RouteStop,
    /// A courier route.
    Route,
    /// A lab case.
    Case,
    /// A chain-of-custody event.
    CustodyEvent,
}

impl std::fmt::Display for AuditEntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PickupRequest => "PickupRequest",
            Self::RouteStop => "RouteStop",
            Self::Route => "Route",
            Self::Case => "Case",
            Self::CustodyEvent => "CustodyEvent",
        };
        f.write_str(s)
    }
}

/// One immutable audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// When the record was appended.
    pub timestamp: Timestamp,
    /// The acting user.
    pub actor: UserId,
    /// The tenant the action ran under.
    pub lab_id: LabId,
    /// What kind of entity was acted on.
    pub entity_kind: AuditEntityKind,
    /// Display form of the entity identifier.
    pub entity_id: String,
    /// What was attempted ("transition", "update", "record", "deny").
    pub action: String,
    /// Status before the action, for transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
    /// Status after the action, for transitions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
    /// Severity classification.
    pub severity: AuditSeverity,
    /// Groups all records of one logical operation.
    pub correlation_id: CorrelationId,
    /// Free-form detail (rejection reasons, flags, distances).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ─── Queries ─────────────────────────────────────────────────────────

/// Filter over the trail; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    /// Match records about this entity.
    pub entity_id: Option<String>,
    /// Match records by this actor.
    pub actor: Option<UserId>,
    /// Match records at or after this time.
    pub from: Option<Timestamp>,
    /// Match records at or before this time.
    pub to: Option<Timestamp>,
    /// Match records at or above this severity.
    pub min_severity: Option<AuditSeverity>,
}

impl AuditQuery {
    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(entity_id) = &self.entity_id {
            if &record.entity_id != entity_id {
                return false;
            }
        }
        if let Some(actor) = self.actor {
            if record.actor != actor {
                return false;
            }
        }
        if let Some(from) = self.from {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.timestamp > to {
                return false;
            }
        }
        if let Some(min) = self.min_severity {
            if record.severity < min {
                return false;
            }
        }
        true
    }
}

// ─── The Trail ───────────────────────────────────────────────────────

/// An append-only, in-memory audit trail.
#[derive(Debug, Default)]
pub struct AuditTrail {
    records: RwLock<Vec<AuditRecord>>,
}

impl AuditTrail {
    /// Create an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. The only write operation the trail exposes.
    pub fn append(&self, record: AuditRecord) {
        info!(
            entity = %record.entity_kind,
            entity_id = %record.entity_id,
            action = %record.action,
            severity = %record.severity,
            correlation = %record.correlation_id,
            "audit"
        );
        let mut guard = self.records.write().unwrap_or_else(|e| e.into_inner());
        guard.push(record);
    }

    /// All records matching the query, in append order.
    pub fn query(&self, query: &AuditQuery) -> Vec<AuditRecord> {
        let guard = self.records.read().unwrap_or_else(|e| e.into_inner());
        guard.iter().filter(|r| query.matches(r)).cloned().collect()
    }

    /// All records for one entity, in append order.
    pub fn for_entity(&self, entity_id: &str) -> Vec<AuditRecord> {
        self.query(&AuditQuery {
            entity_id: Some(entity_id.to_string()),
            ..AuditQuery::default()
        })
    }

    /// Number of records in the trail.
    pub fn len(&self) -> usize {
        let guard = self.records.read().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    /// Whether the trail is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn record(entity_id: &str, actor: UserId, at: &str, severity: AuditSeverity) -> AuditRecord {
        AuditRecord {
            timestamp: ts(at),
            actor,
            lab_id: LabId::new(),
            entity_kind: AuditEntityKind::PickupRequest,
            entity_id: entity_id.to_string(),
            action: "transition".into(),
            previous_status: Some("Pending".into()),
            new_status: Some("Assigned".into()),
            severity,
            correlation_id: CorrelationId::new(),
            detail: None,
        }
    }

    #[test]
    fn test_query_by_entity() {
        let trail = AuditTrail::new();
        let actor = UserId::new();
        trail.append(record("pickup:1", actor, "2026-03-01T09:00:00Z", AuditSeverity::Info));
        trail.append(record("pickup:2", actor, "2026-03-01T09:05:00Z", AuditSeverity::Info));
        trail.append(record("pickup:1", actor, "2026-03-01T09:10:00Z", AuditSeverity::Info));

        let hits = trail.for_entity("pickup:1");
        assert_eq!(hits.len(), 2);
        // Append order is preserved.
        assert!(hits[0].timestamp < hits[1].timestamp);
    }

    #[test]
    fn test_query_by_actor_and_time_range() {
        let trail = AuditTrail::new();
        let alice = UserId::new();
        let bob = UserId::new();
        trail.append(record("pickup:1", alice, "2026-03-01T09:00:00Z", AuditSeverity::Info));
        trail.append(record("pickup:1", bob, "2026-03-01T10:00:00Z", AuditSeverity::Info));
        trail.append(record("pickup:1", alice, "2026-03-01T11:00:00Z", AuditSeverity::Info));

        let hits = trail.query(&AuditQuery {
            actor: Some(alice),
            from: Some(ts("2026-03-01T10:00:00Z")),
            ..AuditQuery::default()
        });
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].timestamp, ts("2026-03-01T11:00:00Z"));
    }

    #[test]
    fn test_query_by_min_severity() {
        let trail = AuditTrail::new();
        let actor = UserId::new();
        trail.append(record("pickup:1", actor, "2026-03-01T09:00:00Z", AuditSeverity::Info));
        trail.append(record("pickup:1", actor, "2026-03-01T09:01:00Z", AuditSeverity::Security));
        trail.append(record("pickup:1", actor, "2026-03-01T09:02:00Z", AuditSeverity::Critical));

        let hits = trail.query(&AuditQuery {
            min_severity: Some(AuditSeverity::Security),
            ..AuditQuery::default()
        });
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let rec = record("pickup:1", UserId::new(), "2026-03-01T09:00:00Z", AuditSeverity::Info);
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("entityKind").is_some());
        assert!(json.get("previousStatus").is_some());
        assert!(json.get("correlationId").is_some());
    }
}
