//! Authenticated principals
//!
//! A [`Principal`] is the identity the transport layer attaches to a
//! connection after authenticating it. The registry and ACL engine only
//! authorize principals; they never authenticate credentials.
//!
//! Principals own their data. Every copy is independent of the value it
//! was cloned from, so a session can keep a principal alive after the
//! connection that supplied it has gone away.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{Result, VecsError};

/// Account name that always resolves to the everyone group
pub const EVERYONE_NAME: &str = "EVERYONE";

/// Numeric id of the root account
pub const ROOT_UID: u32 = 0;

const EVERYONE_ID: u32 = u32::MAX;

/// Category of a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrincipalKind {
    /// Local user account
    User,
    /// Machine or service account
    Machine,
    /// Group of principals
    Group,
    /// Well-known group containing every principal
    Everyone,
}

/// Authenticated identity
///
/// Equality and hashing use the kind and numeric id only. The account name
/// is carried for logging and may differ between two equal principals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    kind: PrincipalKind,
    id: u32,
    name: String,
}

impl Principal {
    /// User account with the given uid
    pub fn user(uid: u32, name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::User,
            id: uid,
            name: name.into(),
        }
    }

    /// Machine account
    pub fn machine(id: u32, name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::Machine,
            id,
            name: name.into(),
        }
    }

    /// Group with the given gid
    pub fn group(gid: u32, name: impl Into<String>) -> Self {
        Self {
            kind: PrincipalKind::Group,
            id: gid,
            name: name.into(),
        }
    }

    /// The root account
    pub fn root() -> Self {
        Self::user(ROOT_UID, "root")
    }

    /// The well-known everyone group
    pub fn everyone() -> Self {
        Self {
            kind: PrincipalKind::Everyone,
            id: EVERYONE_ID,
            name: EVERYONE_NAME.to_string(),
        }
    }

    /// Principal category
    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    /// Numeric uid/gid
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Account name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True for the root account
    pub fn is_root(&self) -> bool {
        self.kind == PrincipalKind::User && self.id == ROOT_UID
    }

    /// True for the well-known everyone group
    pub fn is_well_known_everyone(&self) -> bool {
        self.kind == PrincipalKind::Everyone
    }

    /// True if this principal can stand for a set of principals in an ACE
    pub fn is_group(&self) -> bool {
        matches!(self.kind, PrincipalKind::Group | PrincipalKind::Everyone)
    }

    /// Reject principals that cannot own or be named in a descriptor
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(VecsError::invalid_argument(format!(
                "principal {:?}:{} has an empty name",
                self.kind, self.id
            )));
        }
        Ok(())
    }
}

impl PartialEq for Principal {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for Principal {}

impl Hash for Principal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PrincipalKind::Everyone => write!(f, "{}", self.name),
            _ => write!(f, "{}({})", self.name, self.id),
        }
    }
}
