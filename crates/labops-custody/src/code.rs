//! # Handoff Verification Codes
//!
//! Deterministic 6-digit codes derived from a case id and a timestamp.
//! The same inputs always yield the same code, so a code can be
//! regenerated for comparison instead of being stored — though persisting
//! it is equally valid.
//!
//! This is a low-friction handoff confirmation, not a security control:
//! the derivation is a plain SHA-256 truncation with no secret input.

use sha2::{Digest, Sha256};

use labops_core::{CaseId, Timestamp};

/// Derive the 6-digit verification code for a case handoff.
pub fn generate_verification_code(case_id: &CaseId, timestamp: Timestamp) -> String {
    let input = format!("{}:{}", case_id.as_uuid(), timestamp.epoch_secs());
    let digest = Sha256::digest(input.as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    format!("{:06}", word % 1_000_000)
}
