//! # Domain Identity Newtypes
//!
//! Newtype wrappers for every identifier in the governance layer.
//! These prevent identifier confusion — a `StopId` cannot be passed
//! where a `RouteId` is expected, and a resource's `LabId` cannot be
//! silently swapped for a user id in a tenant check.
//!
//! ## Tenant-Isolation Invariant
//!
//! `LabId` is the isolation boundary for the whole platform. Every
//! tenant-scoped record carries one, and every authorization check
//! compares two of them. Keeping it a distinct type means the compiler
//! rejects any check written against the wrong identifier namespace.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a dental lab — the tenant boundary.
    LabId, "lab"
);
uuid_id!(
    /// Identifier of a clinic served by a lab.
    ClinicId, "clinic"
);
uuid_id!(
    /// Identifier of a lab case (the physical work item in custody).
    CaseId, "case"
);
uuid_id!(
    /// Identifier of a pickup request raised by a clinic or an EHR/CRM.
    PickupRequestId, "pickup"
);
uuid_id!(
    /// Identifier of a courier route.
    RouteId, "route"
);
uuid_id!(
    /// Identifier of a single stop on a route.
    StopId, "stop"
);
uuid_id!(
    /// Identifier of a driver.
    DriverId, "driver"
);
uuid_id!(
    /// Identifier of a vehicle.
    VehicleId, "vehicle"
);
uuid_id!(
    /// Identifier of an authenticated platform user.
    UserId, "user"
);
uuid_id!(
    /// Identifier of a boundary event.
    EventId, "event"
);
uuid_id!(
    /// Correlation identifier linking related cross-component events,
    /// e.g. a stop transition and the custody event it produced.
    CorrelationId, "corr"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(LabId::new(), LabId::new());
        assert_ne!(CaseId::new(), CaseId::new());
    }

    #[test]
    fn test_display_carries_namespace_prefix() {
        let id = RouteId::new();
        let s = id.to_string();
        assert!(s.starts_with("route:"));
        assert_eq!(s.len(), "route:".len() + 36);
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = StopId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: StopId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_correlation_id_distinct_namespace() {
        // Same underlying UUID type, different rendering namespace.
        let c = CorrelationId::new();
        assert!(c.to_string().starts_with("corr:"));
    }
}
