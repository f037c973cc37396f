//! Role and ownership rules shared by every resource.

use crate::models::auth::RequestIdentity;
use crate::repositories::OwnerScope;

/// Outcome of a capability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    Deny,
}

/// The caller lacks the role required for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Admin role required")]
pub struct AccessDenied;

/// Whether the caller may act on a record owned by `owner_id`.
///
/// Admins may act on any record; everyone else only on their own.
pub fn check(identity: &RequestIdentity, owner_id: i32) -> AccessDecision {
    if identity.is_admin() || identity.user_id == owner_id {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny
    }
}

/// Whether the caller may move a record to a different owner
pub fn check_reassign_owner(identity: &RequestIdentity) -> AccessDecision {
    if identity.is_admin() {
        AccessDecision::Allow
    } else {
        AccessDecision::Deny
    }
}

/// Rows of an owned resource the caller may see or target
pub fn expense_scope(identity: &RequestIdentity) -> OwnerScope {
    if identity.is_admin() {
        OwnerScope::Any
    } else {
        OwnerScope::Owner(identity.user_id)
    }
}

pub fn require_admin(identity: &RequestIdentity) -> Result<(), AccessDenied> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(AccessDenied)
    }
}
