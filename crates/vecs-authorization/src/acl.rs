//! Access-control entries and lists
//!
//! An [`Acl`] is an ordered list of allow/deny [`Ace`]s. New entries go to
//! the front. Order carries no meaning during evaluation, which visits
//! every entry.

use serde::{Deserialize, Serialize};
use vecs_core::{AccessMask, Principal, Result};

use crate::descriptor::ChangeStatus;

/// Whether an entry grants or withholds its rights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AceKind {
    /// Grants the entry's rights
    Allowed,
    /// Withholds the entry's rights, overriding any grant
    Denied,
}

/// How [`crate::SecurityDescriptor::modify_permissions`] combines a mask with an existing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifyMode {
    /// Replace the entry's mask
    Set,
    /// OR the mask into the entry
    Add,
    /// Clear the mask's bits from the entry
    Revoke,
}

/// Access-control entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ace {
    principal: Principal,
    kind: AceKind,
    access_mask: AccessMask,
    status: ChangeStatus,
}

impl Ace {
    /// New entry, marked [`ChangeStatus::New`]
    pub fn new(principal: Principal, kind: AceKind, access_mask: AccessMask) -> Self {
        Self {
            principal,
            kind,
            access_mask,
            status: ChangeStatus::New,
        }
    }

    /// Entry loaded from persistent storage, marked [`ChangeStatus::Unchanged`]
    pub fn persisted(principal: Principal, kind: AceKind, access_mask: AccessMask) -> Self {
        Self {
            status: ChangeStatus::Unchanged,
            ..Self::new(principal, kind, access_mask)
        }
    }

    /// Principal or group the entry applies to
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Allow or deny
    pub fn kind(&self) -> AceKind {
        self.kind
    }

    /// Rights covered by the entry
    pub fn access_mask(&self) -> AccessMask {
        self.access_mask
    }

    /// Pending-persistence state
    pub fn status(&self) -> ChangeStatus {
        self.status
    }

    pub(crate) fn matches(&self, principal: &Principal, kind: AceKind) -> bool {
        self.kind == kind && &self.principal == principal
    }

    pub(crate) fn apply(&mut self, access_mask: AccessMask, mode: ModifyMode) {
        self.access_mask = match mode {
            ModifyMode::Set => access_mask,
            ModifyMode::Add => self.access_mask | access_mask,
            ModifyMode::Revoke => self.access_mask & !access_mask,
        };
        self.status = ChangeStatus::Modified;
    }

    pub(crate) fn mark_unchanged(&mut self) {
        self.status = ChangeStatus::Unchanged;
    }
}

/// Ordered list of entries, most recently added first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    entries: Vec<Ace>,
}

impl Acl {
    /// Empty list; denies everyone but the owner and root
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries in evaluation order
    pub fn from_entries(entries: Vec<Ace>) -> Self {
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the list has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in list order
    pub fn iter(&self) -> impl Iterator<Item = &Ace> {
        self.entries.iter()
    }

    /// Entry for exactly this principal and kind
    pub fn find(&self, principal: &Principal, kind: AceKind) -> Option<&Ace> {
        self.entries.iter().find(|ace| ace.matches(principal, kind))
    }

    pub(crate) fn position(&self, principal: &Principal, kind: AceKind) -> Option<usize> {
        self.entries.iter().position(|ace| ace.matches(principal, kind))
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Ace> {
        self.entries.get_mut(index)
    }

    /// Insert at the front of the list
    ///
    /// Capacity is reserved first, so an allocation failure leaves the
    /// list as it was.
    pub fn push_front(&mut self, ace: Ace) -> Result<()> {
        self.entries.try_reserve(1)?;
        self.entries.insert(0, ace);
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Ace {
        self.entries.remove(index)
    }

    pub(crate) fn mark_unchanged(&mut self) {
        self.entries.iter_mut().for_each(Ace::mark_unchanged);
    }
}

impl<'a> IntoIterator for &'a Acl {
    type Item = &'a Ace;
    type IntoIter = std::slice::Iter<'a, Ace>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecs_core::{READ_STORE, WRITE_STORE};

    fn bob() -> Principal {
        Principal::user(1002, "bob")
    }

    #[test]
    fn push_front_keeps_newest_first() {
        let mut acl = Acl::new();
        acl.push_front(Ace::new(bob(), AceKind::Allowed, READ_STORE))
            .unwrap();
        acl.push_front(Ace::new(bob(), AceKind::Denied, WRITE_STORE))
            .unwrap();

        let kinds: Vec<_> = acl.iter().map(Ace::kind).collect();
        assert_eq!(kinds, vec![AceKind::Denied, AceKind::Allowed]);
        assert_eq!(acl.len(), 2);
    }

    #[test]
    fn find_matches_principal_and_kind() {
        let acl = Acl::from_entries(vec![Ace::new(bob(), AceKind::Allowed, READ_STORE)]);
        assert!(acl.find(&bob(), AceKind::Allowed).is_some());
        assert!(acl.find(&bob(), AceKind::Denied).is_none());
        assert!(acl
            .find(&Principal::user(1003, "carol"), AceKind::Allowed)
            .is_none());
    }

    #[test]
    fn apply_combines_per_mode() {
        let mut ace = Ace::persisted(bob(), AceKind::Allowed, READ_STORE);
        ace.apply(WRITE_STORE, ModifyMode::Add);
        assert_eq!(ace.access_mask(), READ_STORE | WRITE_STORE);
        assert_eq!(ace.status(), ChangeStatus::Modified);

        ace.apply(READ_STORE, ModifyMode::Revoke);
        assert_eq!(ace.access_mask(), WRITE_STORE);

        ace.apply(READ_STORE, ModifyMode::Set);
        assert_eq!(ace.access_mask(), READ_STORE);
    }
}
