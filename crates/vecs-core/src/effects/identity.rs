//! Identity lookups
//!
//! Group membership and account name resolution depend on a directory the
//! subsystem does not own, so both are injected.

use crate::errors::Result;
use crate::types::principal::Principal;

/// Group membership predicate used during ACL evaluation
pub trait GroupMembership: Send + Sync {
    /// True if `principal` is a member of `group`
    ///
    /// Called for every ACE whose principal is not equal to the caller.
    /// Implementations must answer consistently for the lifetime of a
    /// session.
    fn belongs_to_group(&self, principal: &Principal, group: &Principal) -> bool;
}

impl<T: GroupMembership + ?Sized> GroupMembership for std::sync::Arc<T> {
    fn belongs_to_group(&self, principal: &Principal, group: &Principal) -> bool {
        (**self).belongs_to_group(principal, group)
    }
}

/// Account name resolution for permission and ownership edits
pub trait PrincipalResolver: Send + Sync {
    /// Resolve an account name to a principal
    ///
    /// The name `EVERYONE` must resolve to [`Principal::everyone`].
    fn resolve_principal(&self, name: &str) -> Result<Principal>;
}

impl<T: PrincipalResolver + ?Sized> PrincipalResolver for std::sync::Arc<T> {
    fn resolve_principal(&self, name: &str) -> Result<Principal> {
        (**self).resolve_principal(name)
    }
}
