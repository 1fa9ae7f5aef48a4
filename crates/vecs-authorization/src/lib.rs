//! # VECS Authorization - Layer 2: Security Descriptors
//!
//! **Purpose**: Owner + ACL model for certificate stores and the access
//! check that every store operation goes through.
//!
//! - YES [`SecurityDescriptor`] with an owner, an ordered [`Acl`], a revision and change tracking
//! - YES allow/deny evaluation ([`check_access`])
//! - YES ACE list edits ([`SecurityDescriptor::modify_permissions`]) and ownership transfer
//! - NO handle validation or session caching (that's `vecs-store`)
//! - NO persistence of descriptors (the store catalog owns that)
//!
//! Descriptors own every principal they mention. `Clone` is a deep copy,
//! and dropping a descriptor releases its owner and all of its ACEs, so a
//! partially built descriptor never needs explicit cleanup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Access-control entries and lists
pub mod acl;

/// Access evaluation
pub mod access;

/// Security descriptors
pub mod descriptor;

pub use access::{check_access, check_acl};
pub use acl::{Ace, AceKind, Acl, ModifyMode};
pub use descriptor::{ChangeStatus, SecurityDescriptor};
