//! Effect traits
//!
//! Capabilities the registry and ACL engine need from their environment.
//! Production handlers live in `vecs-effects`; deterministic handlers for
//! tests live in `vecs-testkit`.

pub mod identity;
pub mod nonce;

pub use identity::{GroupMembership, PrincipalResolver};
pub use nonce::NonceEffects;
