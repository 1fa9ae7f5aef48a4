//! Access evaluation
//!
//! Root and the owner are granted unconditionally. Everyone else is
//! evaluated against the ACL:
//!
//! 1. Every entry whose principal is the caller, or a group the caller
//!    belongs to, is visited.
//! 2. A matching deny entry that shares any bit with the request fails
//!    the check immediately.
//! 3. Matching allow entries accumulate into a granted mask.
//! 4. The request succeeds only if the granted mask covers every
//!    requested bit.

use vecs_core::{AccessMask, GroupMembership, Principal, Result, VecsError};

use crate::acl::{AceKind, Acl};
use crate::descriptor::SecurityDescriptor;

/// Authorize `principal` for `desired` against a descriptor
pub fn check_access(
    descriptor: &SecurityDescriptor,
    principal: &Principal,
    desired: AccessMask,
    membership: &dyn GroupMembership,
) -> Result<()> {
    if principal.is_root() || descriptor.is_owner(principal) {
        return Ok(());
    }
    check_acl(descriptor.acl(), principal, desired, membership)
}

/// Evaluate the ACL alone, without the owner and root bypass
pub fn check_acl(
    acl: &Acl,
    principal: &Principal,
    desired: AccessMask,
    membership: &dyn GroupMembership,
) -> Result<()> {
    if acl.is_empty() {
        return Err(VecsError::access_denied(format!(
            "{principal} is not the owner and the ACL is empty"
        )));
    }

    let mut granted: AccessMask = 0;
    for ace in acl {
        let applies = ace.principal() == principal
            || membership.belongs_to_group(principal, ace.principal());
        if !applies {
            continue;
        }
        match ace.kind() {
            AceKind::Denied if ace.access_mask() & desired != 0 => {
                tracing::debug!(
                    %principal,
                    entry = %ace.principal(),
                    denied = ace.access_mask() & desired,
                    "deny entry matched request"
                );
                return Err(VecsError::access_denied(format!(
                    "{principal} is denied {:#x} by the entry for {}",
                    ace.access_mask() & desired,
                    ace.principal()
                )));
            }
            AceKind::Denied => {}
            AceKind::Allowed => granted |= ace.access_mask(),
        }
    }

    if granted & desired != desired {
        return Err(VecsError::access_denied(format!(
            "{principal} requested {desired:#x} but was granted {granted:#x}"
        )));
    }
    Ok(())
}
