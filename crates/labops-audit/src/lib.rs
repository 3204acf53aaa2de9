//! # labops-audit
//!
//! Append-only audit trail for the LabOps governance layer. Every
//! accepted transition, rejected write, access denial, and custody
//! recording leaves a record here; records are immutable once appended.

pub mod trail;

pub use trail::{AuditEntityKind, AuditQuery, AuditRecord, AuditSeverity, AuditTrail};
