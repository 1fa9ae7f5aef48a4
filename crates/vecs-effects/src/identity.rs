//! Account and group lookup
//!
//! [`WellKnownGroups`] is the membership source used when no directory is
//! configured: every principal belongs to the everyone group and nothing
//! else. [`AccountsDirectory`] asks the host's account databases through
//! `getpwnam_r`/`getgrnam_r`, so NSS backed users and groups resolve the
//! same way local ones do.

use nix::unistd::{Gid, Group, User};

use vecs_core::{GroupMembership, Principal, PrincipalResolver, Result, VecsError, EVERYONE_NAME};

/// Membership in the everyone group only
#[derive(Debug, Clone, Default)]
pub struct WellKnownGroups;

impl GroupMembership for WellKnownGroups {
    fn belongs_to_group(&self, _principal: &Principal, group: &Principal) -> bool {
        group.is_well_known_everyone()
    }
}

/// Users and groups known to the host's name service
#[derive(Debug, Clone, Default)]
pub struct AccountsDirectory;

impl AccountsDirectory {
    /// Directory backed by the host's passwd and group databases
    pub fn system() -> Self {
        Self
    }

    fn user(name: &str) -> Result<Option<User>> {
        User::from_name(name)
            .map_err(|errno| VecsError::internal(format!("looking up user {name:?}: {errno}")))
    }

    fn group(name: &str) -> Result<Option<Group>> {
        Group::from_name(name)
            .map_err(|errno| VecsError::internal(format!("looking up group {name:?}: {errno}")))
    }
}

impl PrincipalResolver for AccountsDirectory {
    fn resolve_principal(&self, name: &str) -> Result<Principal> {
        if name.eq_ignore_ascii_case(EVERYONE_NAME) {
            return Ok(Principal::everyone());
        }
        if let Some(user) = Self::user(name)? {
            return Ok(Principal::user(user.uid.as_raw(), name));
        }
        if let Some(group) = Self::group(name)? {
            return Ok(Principal::group(group.gid.as_raw(), name));
        }
        Err(VecsError::not_found(format!("no account or group named {name:?}")))
    }
}

impl GroupMembership for AccountsDirectory {
    fn belongs_to_group(&self, principal: &Principal, group: &Principal) -> bool {
        if group.is_well_known_everyone() {
            return true;
        }
        if !group.is_group() || principal.is_group() {
            return false;
        }
        let account = match Self::user(principal.name()) {
            Ok(Some(account)) if account.uid.as_raw() == principal.id() => account,
            Ok(_) => return false,
            Err(error) => {
                tracing::warn!(%principal, %error, "membership lookup failed");
                return false;
            }
        };
        if account.gid.as_raw() == group.id() {
            return true;
        }
        match Group::from_gid(Gid::from_raw(group.id())) {
            Ok(Some(entry)) => entry.mem.iter().any(|member| member == principal.name()),
            Ok(None) => false,
            Err(errno) => {
                tracing::warn!(%group, %errno, "group lookup failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // uid 0 and gid 0 are named root on every supported host;
    // nothing else about the host's accounts is assumed
    const MISSING: &str = "vecs-no-such-account-7f3a";

    #[test]
    fn everyone_resolves_case_insensitively() {
        let dir = AccountsDirectory::system();
        assert_eq!(dir.resolve_principal("everyone").unwrap(), Principal::everyone());
        assert_eq!(dir.resolve_principal("EVERYONE").unwrap(), Principal::everyone());
    }

    #[test]
    fn root_account_resolves_as_user() {
        let root = AccountsDirectory::system().resolve_principal("root").unwrap();
        assert_eq!(root, Principal::root());
        assert!(!root.is_group());
    }

    #[test]
    fn unknown_name_is_not_found() {
        let err = AccountsDirectory::system().resolve_principal(MISSING).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn primary_group_counts_as_membership() {
        let dir = AccountsDirectory::system();
        let root_group = Principal::group(0, "root");
        assert!(dir.belongs_to_group(&Principal::root(), &root_group));
        assert!(dir.belongs_to_group(&Principal::root(), &Principal::everyone()));
    }

    #[test]
    fn membership_requires_matching_uid() {
        let dir = AccountsDirectory::system();
        let impostor = Principal::user(4242, "root");
        assert!(!dir.belongs_to_group(&impostor, &Principal::group(0, "root")));
        let unknown = Principal::user(4243, MISSING);
        assert!(!dir.belongs_to_group(&unknown, &Principal::group(0, "root")));
    }

    #[test]
    fn groups_are_not_members_of_groups() {
        let dir = AccountsDirectory::system();
        let root_group = Principal::group(0, "root");
        assert!(!dir.belongs_to_group(&root_group, &root_group));
        assert!(!dir.belongs_to_group(&Principal::root(), &Principal::root()));
    }

    #[test]
    fn well_known_groups_only_know_everyone() {
        let groups = WellKnownGroups;
        let alice = Principal::user(1001, "alice");
        assert!(groups.belongs_to_group(&alice, &Principal::everyone()));
        assert!(!groups.belongs_to_group(&alice, &Principal::group(2000, "certadmins")));
    }
}
