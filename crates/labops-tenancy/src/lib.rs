//! # labops-tenancy
//!
//! Tenant isolation and write safety for the LabOps logistics stack:
//! per-request [`TenantContext`] resolution, fail-closed authorization,
//! defense-in-depth result filtering, and optimistic concurrency
//! control over versioned entities.
//!
//! ## Design Notes
//!
//! - **No ambient tenant.** The context is a parameter, never a global —
//!   every call site names the tenant it acts for.
//! - **Fail closed.** Authorization denies on any lab mismatch; denials
//!   are logged and audit-logged upstream.
//! - **No auto-merge.** A stale write is rejected with both versions;
//!   the writer re-reads and retries.

pub mod concurrency;
pub mod context;

pub use concurrency::{
    ConcurrencyError, ConcurrencyGuard, InMemoryVersionedStore, Versioned, VersionedStore,
};
pub use context::{
    authorize, filter_to_tenant, SessionCredential, TenancyError, TenantContext, TenantScoped,
};
