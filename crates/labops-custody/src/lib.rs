//! # labops-custody
//!
//! Chain-of-custody primitives for the LabOps logistics stack: geohash
//! encoding and distance checks, handoff verification codes, and the
//! append-only custody ledger.
//!
//! ## Design Notes
//!
//! - **Append-only.** Custody events are never edited or deleted; a
//!   correction is a new `Exception` event referencing the earlier one
//!   in its notes.
//! - **Lenient location checks.** An out-of-tolerance delivery location
//!   is flagged and logged rather than blocking the handoff — clinic
//!   registration coordinates are too coarse to gate physical delivery.
//! - **Deterministic codes.** Verification codes derive from the case
//!   identifier and issuance time, so a code can be re-derived for
//!   support inquiries without a lookup table.
//!
//! ## Module Map
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`geo`] | Geohash codec, haversine distance, tolerance checks |
//! | [`code`] | 6-digit handoff verification codes |
//! | [`ledger`] | Custody events, chain verification, the ledger |
//! | [`store`] | Append-only storage seam and in-memory store |

pub mod code;
pub mod geo;
pub mod ledger;
pub mod store;

pub use code::generate_verification_code;
pub use geo::{
    haversine_km, within_tolerance, GeoCheck, GeoError, DEFAULT_ARRIVAL_TOLERANCE_METERS,
    DEFAULT_GEOHASH_PRECISION,
};
pub use ledger::{
    validate_delivery_location, validate_delivery_location_default, verify_chain, ChainReport,
    CustodyError, CustodyEvent, CustodyEventDraft, CustodyEventType, CustodyLedger,
    CustodyLocation, CustodyVerification, LocationCheck,
};
pub use store::{CustodyStore, InMemoryCustodyStore};
