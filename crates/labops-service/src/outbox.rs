//! # Outbound Event Buffer
//!
//! Accepted operations stage their notifications here; a delivery
//! worker drains the buffer and publishes to the message bus. Events
//! are staged only after the owning write has committed, so a drained
//! event always describes durable state.

use std::sync::RwLock;

use labops_events::{
    CaseDeliveryCompleted, EventEnvelope, LogisticsDeliveryCompleted, PickupStatusChanged,
    RouteStopStatusChanged,
};

/// Every notification the pipeline can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// A pickup request changed status.
    PickupStatusChanged(EventEnvelope<PickupStatusChanged>),
    /// A route stop changed status.
    RouteStopStatusChanged(EventEnvelope<RouteStopStatusChanged>),
    /// A case was delivered, with proof and SLA outcome.
    CaseDeliveryCompleted(EventEnvelope<CaseDeliveryCompleted>),
    /// A delivery completed, from the billing side.
    LogisticsDeliveryCompleted(EventEnvelope<LogisticsDeliveryCompleted>),
}

impl OutboundEvent {
    /// The envelope's dotted event type.
    pub fn event_type(&self) -> &str {
        match self {
            Self::PickupStatusChanged(e) => &e.event_type,
            Self::RouteStopStatusChanged(e) => &e.event_type,
            Self::CaseDeliveryCompleted(e) => &e.event_type,
            Self::LogisticsDeliveryCompleted(e) => &e.event_type,
        }
    }
}

/// Staged outbound events awaiting delivery.
#[derive(Debug, Default)]
pub struct Outbox {
    events: RwLock<Vec<OutboundEvent>>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an event.
    pub fn push(&self, event: OutboundEvent) {
        let mut guard = self.events.write().unwrap_or_else(|e| e.into_inner());
        guard.push(event);
    }

    /// Remove and return all staged events, oldest first.
    pub fn drain(&self) -> Vec<OutboundEvent> {
        let mut guard = self.events.write().unwrap_or_else(|e| e.into_inner());
        guard.drain(..).collect()
    }

    /// Number of staged events.
    pub fn len(&self) -> usize {
        let guard = self.events.read().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    /// Whether the outbox is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
