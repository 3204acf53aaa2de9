//! # Temporal Types — UTC-Only Timestamps
//!
//! Defines `Timestamp`, a UTC-only timestamp with seconds precision.
//!
//! Every timestamp that crosses the governance boundary — custody events,
//! audit records, SLA windows, boundary event envelopes — renders as
//! `YYYY-MM-DDTHH:MM:SSZ`. Local offsets would make chain-of-custody
//! ordering and event correlation ambiguous across the systems that feed
//! this layer, so non-UTC inputs are rejected at construction on the
//! strict path.
//!
//! Inbound EHR/CRM payloads arrive with arbitrary offsets; those go
//! through [`Timestamp::parse_lenient()`], which converts to UTC on
//! ingestion. Everything after the boundary is already normalized.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// A UTC timestamp truncated to seconds precision.
///
/// # Construction
///
/// - [`Timestamp::now()`] — current UTC time, truncated.
/// - [`Timestamp::from_utc()`] — from a `DateTime<Utc>`, truncating.
/// - [`Timestamp::parse()`] — strict: ISO-8601 with `Z` suffix only.
/// - [`Timestamp::parse_lenient()`] — any RFC 3339 offset, converted to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to seconds.
    pub fn now() -> Self {
        Self(truncate_to_seconds(Utc::now()))
    }

    /// From a `chrono::DateTime<Utc>`, truncating sub-seconds.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(truncate_to_seconds(dt))
    }

    /// Strict parse: accepts only RFC 3339 strings with the `Z` suffix.
    ///
    /// Offsets such as `+00:00` are rejected even though they denote the
    /// same instant — the governance layer stores and compares exactly
    /// one canonical rendering.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Validation`] for non-RFC-3339 input or
    /// any non-`Z` offset.
    pub fn parse(s: &str) -> Result<Self, GovernanceError> {
        if !s.ends_with('Z') {
            return Err(GovernanceError::Validation(format!(
                "timestamp must use Z suffix (UTC only), got {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            GovernanceError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Lenient parse for ingesting external payloads: accepts any RFC 3339
    /// offset and converts to UTC. The result satisfies the same invariant
    /// as the strict path.
    pub fn parse_lenient(s: &str) -> Result<Self, GovernanceError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| {
            GovernanceError::Validation(format!("invalid RFC 3339 timestamp {s:?}: {e}"))
        })?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Whole minutes from `earlier` to `self`; negative when `self` is
    /// before `earlier`. Used for SLA variance reporting.
    pub fn minutes_since(&self, earlier: Timestamp) -> i64 {
        (self.0 - earlier.0).num_minutes()
    }

    /// A timestamp `minutes` later than this one.
    pub fn plus_minutes(&self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    /// Render as ISO-8601 with `Z` suffix, e.g. `2026-03-01T09:30:00Z`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
