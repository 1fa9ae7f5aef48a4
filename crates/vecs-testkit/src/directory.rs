//! Fixed account directory

use std::collections::{HashMap, HashSet};

use vecs_core::{GroupMembership, Principal, PrincipalResolver, Result, VecsError, EVERYONE_NAME};

/// Accounts and group memberships declared up front
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    by_name: HashMap<String, Principal>,
    memberships: HashSet<(Principal, Principal)>,
}

impl StaticDirectory {
    /// Directory that only knows the everyone group
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `principal` resolvable by its name
    pub fn with_principal(mut self, principal: &Principal) -> Self {
        self.by_name
            .insert(principal.name().to_string(), principal.clone());
        self
    }

    /// Put `member` into `group`, registering both
    pub fn with_member(mut self, group: &Principal, member: &Principal) -> Self {
        self.memberships.insert((group.clone(), member.clone()));
        self.with_principal(group).with_principal(member)
    }
}

impl PrincipalResolver for StaticDirectory {
    fn resolve_principal(&self, name: &str) -> Result<Principal> {
        if name.eq_ignore_ascii_case(EVERYONE_NAME) {
            return Ok(Principal::everyone());
        }
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| VecsError::not_found(format!("account {name}")))
    }
}

impl GroupMembership for StaticDirectory {
    fn belongs_to_group(&self, principal: &Principal, group: &Principal) -> bool {
        group.is_well_known_everyone()
            || self
                .memberships
                .contains(&(group.clone(), principal.clone()))
    }
}
