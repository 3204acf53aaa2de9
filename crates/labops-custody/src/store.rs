//! # Custody Event Storage
//!
//! The append-only storage seam behind [`CustodyLedger`]. Stores assign
//! a per-case sequence number on append and never expose mutation or
//! deletion of recorded events.
//!
//! [`CustodyLedger`]: crate::ledger::CustodyLedger

use std::collections::HashMap;
use std::sync::RwLock;

use labops_core::{CaseId, Timestamp};

use crate::ledger::{CustodyError, CustodyEvent};

/// Append-only storage for custody events.
pub trait CustodyStore {
    /// Append an event, returning its per-case sequence number
    /// (starting at 0).
    fn append(&self, event: CustodyEvent) -> Result<u64, CustodyError>;

    /// All events for a case in sequence order.
    fn events_for_case(&self, case_id: CaseId) -> Vec<CustodyEvent>;

    /// Events for a case recorded within `[from, to]`, in sequence order.
    fn events_in_range(&self, case_id: CaseId, from: Timestamp, to: Timestamp)
        -> Vec<CustodyEvent>;
}

/// In-memory store used by tests and single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryCustodyStore {
    events: RwLock<HashMap<CaseId, Vec<(u64, CustodyEvent)>>>,
}

impl InMemoryCustodyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total event count across all cases.
    pub fn len(&self) -> usize {
        let guard = self.events.read().unwrap_or_else(|e| e.into_inner());
        guard.values().map(Vec::len).sum()
    }

    /// Whether the store holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CustodyStore for InMemoryCustodyStore {
    fn append(&self, event: CustodyEvent) -> Result<u64, CustodyError> {
        let mut guard = self.events.write().unwrap_or_else(|e| e.into_inner());
        let chain = guard.entry(event.case_id).or_default();
        let seq = chain.len() as u64;
        chain.push((seq, event));
        Ok(seq)
    }

    fn events_for_case(&self, case_id: CaseId) -> Vec<CustodyEvent> {
        let guard = self.events.read().unwrap_or_else(|e| e.into_inner());
        guard
            .get(&case_id)
            .map(|chain| chain.iter().map(|(_, e)| e.clone()).collect())
            .unwrap_or_default()
    }

    fn events_in_range(
        &self,
        case_id: CaseId,
        from: Timestamp,
        to: Timestamp,
    ) -> Vec<CustodyEvent> {
        let guard = self.events.read().unwrap_or_else(|e| e.into_inner());
        guard
            .get(&case_id)
            .map(|chain| {
                chain
                    .iter()
                    .filter(|(_, e)| e.recorded_at >= from && e.recorded_at <= to)
                    .map(|(_, e)| e.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CustodyEventType, CustodyLocation};
    use labops_core::EventId;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn event(case_id: CaseId, at: &str) -> CustodyEvent {
        CustodyEvent {
            id: EventId::new(),
            case_id,
            event_type: CustodyEventType::InTransit,
            actor: "courier-12".into(),
            location: CustodyLocation {
                description: "Van".into(),
                coordinates: None,
            },
            geohash: None,
            verification: None,
            notes: None,
            flags: Vec::new(),
            recorded_at: ts(at),
        }
    }

    #[test]
    fn test_append_assigns_per_case_sequence() {
        let store = InMemoryCustodyStore::new();
        let a = CaseId::new();
        let b = CaseId::new();
        assert_eq!(store.append(event(a, "2026-03-01T09:00:00Z")).unwrap(), 0);
        assert_eq!(store.append(event(a, "2026-03-01T09:10:00Z")).unwrap(), 1);
        assert_eq!(store.append(event(b, "2026-03-01T09:20:00Z")).unwrap(), 0);
        assert_eq!(store.events_for_case(a).len(), 2);
        assert_eq!(store.events_for_case(b).len(), 1);
    }

    #[test]
    fn test_events_in_range_is_inclusive() {
        let store = InMemoryCustodyStore::new();
        let case = CaseId::new();
        store.append(event(case, "2026-03-01T09:00:00Z")).unwrap();
        store.append(event(case, "2026-03-01T10:00:00Z")).unwrap();
        store.append(event(case, "2026-03-01T11:00:00Z")).unwrap();
        let window = store.events_in_range(
            case,
            ts("2026-03-01T09:00:00Z"),
            ts("2026-03-01T10:00:00Z"),
        );
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn test_unknown_case_yields_empty() {
        let store = InMemoryCustodyStore::new();
        assert!(store.events_for_case(CaseId::new()).is_empty());
        assert!(store.is_empty());
    }
}
