//! Security descriptors
//!
//! A descriptor names the owner of a store and carries the ACL that
//! governs everyone else. The owner always has full access; an empty ACL
//! therefore locks a store to its owner (and root).

use serde::{Deserialize, Serialize};
use vecs_core::{AccessMask, Principal, Result, VecsError};

use crate::acl::{Ace, AceKind, Acl, ModifyMode};

/// Pending-persistence state of a descriptor or entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeStatus {
    /// Created since the last load
    New,
    /// Edited since the last load
    Modified,
    /// Matches persistent storage
    Unchanged,
}

/// Owner, ACL, and revision of one certificate store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDescriptor {
    owner: Principal,
    acl: Acl,
    revision: u32,
    status: ChangeStatus,
}

impl SecurityDescriptor {
    /// Descriptor owned by `owner` with an empty ACL at revision 0
    pub fn init(owner: &Principal) -> Result<Self> {
        Self::with_revision(owner, 0)
    }

    /// Descriptor owned by `owner` with an empty ACL at the given revision
    pub fn with_revision(owner: &Principal, revision: u32) -> Result<Self> {
        owner
            .validate()
            .map_err(|e| VecsError::invalid_argument(format!("descriptor owner: {e}")))?;
        Ok(Self {
            owner: owner.clone(),
            acl: Acl::new(),
            revision,
            status: ChangeStatus::New,
        })
    }

    /// Descriptor as read back from persistent storage
    pub fn from_parts(owner: Principal, acl: Acl, revision: u32) -> Result<Self> {
        owner
            .validate()
            .map_err(|e| VecsError::invalid_argument(format!("descriptor owner: {e}")))?;
        Ok(Self {
            owner,
            acl,
            revision,
            status: ChangeStatus::Unchanged,
        })
    }

    /// Current owner
    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    /// Access-control list
    pub fn acl(&self) -> &Acl {
        &self.acl
    }

    /// Descriptor format revision
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Pending-persistence state
    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    /// True if `principal` is the literal owner
    pub fn is_owner(&self, principal: &Principal) -> bool {
        &self.owner == principal
    }

    /// Mark the descriptor and every entry as matching persistent storage
    pub fn mark_persisted(&mut self) {
        self.status = ChangeStatus::Unchanged;
        self.acl.mark_unchanged();
    }

    /// Edit the entry for `(principal, kind)`
    ///
    /// A missing entry is created unless `mode` is [`ModifyMode::Revoke`].
    /// A revoke that clears every bit removes the entry. Naming the owner
    /// is a no-op because the owner's access never depends on the ACL.
    /// The caller is responsible for checking that the requester owns the
    /// store.
    pub fn modify_permissions(
        &mut self,
        principal: &Principal,
        access_mask: AccessMask,
        kind: AceKind,
        mode: ModifyMode,
    ) -> Result<()> {
        if access_mask == 0 {
            return Err(VecsError::invalid_argument("access mask must not be empty"));
        }
        principal.validate()?;

        if self.is_owner(principal) {
            tracing::debug!(%principal, "permission edit names the owner; nothing to change");
            return Ok(());
        }

        match self.acl.position(principal, kind) {
            None if mode == ModifyMode::Revoke => return Ok(()),
            None => {
                self.acl
                    .push_front(Ace::new(principal.clone(), kind, access_mask))?;
            }
            Some(index) => {
                let emptied = match self.acl.get_mut(index) {
                    Some(ace) => {
                        ace.apply(access_mask, mode);
                        ace.access_mask() == 0
                    }
                    None => {
                        return Err(VecsError::internal("ACE index out of range"));
                    }
                };
                if emptied {
                    self.acl.remove(index);
                }
            }
        }

        self.mark_modified();
        Ok(())
    }

    /// Hand ownership to `new_owner`
    ///
    /// The caller is responsible for checking that the requester owns the
    /// store. Naming the current owner is a no-op.
    pub fn modify_owner(&mut self, new_owner: &Principal) -> Result<()> {
        new_owner.validate()?;
        if self.is_owner(new_owner) {
            return Ok(());
        }
        let previous = std::mem::replace(&mut self.owner, new_owner.clone());
        tracing::debug!(%previous, owner = %self.owner, "descriptor owner replaced");
        self.mark_modified();
        Ok(())
    }

    fn mark_modified(&mut self) {
        if self.status == ChangeStatus::Unchanged {
            self.status = ChangeStatus::Modified;
        }
    }
}
