//! # Tenant Context
//!
//! Every request into the governance layer carries an explicit
//! [`TenantContext`] resolved from the caller's session credential.
//! The context is never stored in a global or thread-local — it is a
//! plain parameter, so every call site shows which tenant it acts for.
//!
//! ## Fail-Closed Authorization
//!
//! [`authorize`] compares the context's lab against the resource's lab
//! and denies on any mismatch. Denials are logged as security-relevant
//! events; callers additionally append them to the audit trail.
//!
//! ## Defense in Depth
//!
//! [`filter_to_tenant`] drops foreign-tenant items from any collection
//! of [`TenantScoped`] values. It is applied to query results even when
//! the query was already scoped, so a scoping bug upstream cannot leak
//! another lab's data.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use labops_core::{LabId, UserId};

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors raised during context resolution and authorization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenancyError {
    /// The session credential does not identify a lab.
    #[error("session credential carries no lab identifier")]
    InvalidContext,

    /// The context's lab does not own the resource.
    #[error("access denied: context lab {context_lab} does not own resource of lab {resource_lab}")]
    AccessDenied {
        /// The requesting context's lab.
        context_lab: LabId,
        /// The lab that owns the resource.
        resource_lab: LabId,
    },
}

// ─── Session & Context ───────────────────────────────────────────────

/// A caller's session as presented at the boundary, before resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredential {
    /// The lab the session is bound to; absent for unscoped sessions,
    /// which are rejected.
    pub lab_id: Option<LabId>,
    /// The acting user.
    pub user_id: UserId,
    /// The user's role within the lab.
    pub role_id: String,
}

/// The resolved tenant context threaded through every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    /// The lab all operations in this context are scoped to.
    pub lab_id: LabId,
    /// The acting user.
    pub user_id: UserId,
    /// The acting user's role.
    pub role_id: String,
}

impl TenantContext {
    /// Resolve a context from a session credential.
    ///
    /// Fails with [`TenancyError::InvalidContext`] when the credential
    /// carries no lab binding.
    pub fn resolve(credential: &SessionCredential) -> Result<Self, TenancyError> {
        let lab_id = credential.lab_id.ok_or(TenancyError::InvalidContext)?;
        Ok(Self {
            lab_id,
            user_id: credential.user_id,
            role_id: credential.role_id.clone(),
        })
    }
}

// ─── Authorization ───────────────────────────────────────────────────

/// Check that the context's lab owns the resource.
///
/// Fail-closed: any mismatch is a denial, and denials are logged at
/// warn level as security-relevant events.
pub fn authorize(ctx: &TenantContext, resource_lab: LabId) -> Result<(), TenancyError> {
    if ctx.lab_id == resource_lab {
        return Ok(());
    }
    warn!(
        context_lab = %ctx.lab_id,
        resource_lab = %resource_lab,
        user = %ctx.user_id,
        "cross-tenant access denied"
    );
    Err(TenancyError::AccessDenied {
        context_lab: ctx.lab_id,
        resource_lab,
    })
}

// ─── Tenant Scoping ──────────────────────────────────────────────────

/// Implemented by every entity that belongs to a lab.
pub trait TenantScoped {
    /// The owning lab.
    fn lab_id(&self) -> LabId;
}

impl TenantScoped for labops_core::Case {
    fn lab_id(&self) -> LabId {
        self.lab_id
    }
}

/// Drop items not owned by the context's lab.
///
/// Applied to query results regardless of whether the query itself was
/// scoped.
pub fn filter_to_tenant<T: TenantScoped>(items: Vec<T>, ctx: &TenantContext) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| item.lab_id() == ctx.lab_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(lab_id: Option<LabId>) -> SessionCredential {
        SessionCredential {
            lab_id,
            user_id: UserId::new(),
            role_id: "dispatcher".into(),
        }
    }

    struct Scoped {
        lab: LabId,
        tag: &'static str,
    }

    impl TenantScoped for Scoped {
        fn lab_id(&self) -> LabId {
            self.lab
        }
    }

    #[test]
    fn test_resolve_requires_lab_binding() {
        let lab = LabId::new();
        let ctx = TenantContext::resolve(&credential(Some(lab))).unwrap();
        assert_eq!(ctx.lab_id, lab);

        let err = TenantContext::resolve(&credential(None)).unwrap_err();
        assert_eq!(err, TenancyError::InvalidContext);
    }

    #[test]
    fn test_authorize_same_lab_passes() {
        let lab = LabId::new();
        let ctx = TenantContext::resolve(&credential(Some(lab))).unwrap();
        assert!(authorize(&ctx, lab).is_ok());
    }

    #[test]
    fn test_authorize_denies_foreign_lab() {
        let lab = LabId::new();
        let other = LabId::new();
        let ctx = TenantContext::resolve(&credential(Some(lab))).unwrap();
        let err = authorize(&ctx, other).unwrap_err();
        assert_eq!(
            err,
            TenancyError::AccessDenied {
                context_lab: lab,
                resource_lab: other,
            }
        );
    }

    #[test]
    fn test_context_wire_shape_is_camel_case() {
        let lab = LabId::new();
        let ctx = TenantContext::resolve(&credential(Some(lab))).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&ctx).unwrap()).unwrap();
        assert!(json.get("labId").is_some());
        assert!(json.get("userId").is_some());
        assert_eq!(json["roleId"], "dispatcher");

        let back: TenantContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn test_filter_drops_foreign_items() {
        let lab = LabId::new();
        let other = LabId::new();
        let ctx = TenantContext::resolve(&credential(Some(lab))).unwrap();
        let items = vec![
            Scoped { lab, tag: "mine" },
            Scoped { lab: other, tag: "theirs" },
            Scoped { lab, tag: "also mine" },
        ];
        let kept = filter_to_tenant(items, &ctx);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|i| i.tag != "theirs"));
    }
}
