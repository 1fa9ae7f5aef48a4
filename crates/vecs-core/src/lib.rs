//! # VECS Core - Layer 1: Foundation
//!
//! **Purpose**: Shared vocabulary for the certificate store session subsystem.
//!
//! Every other crate in the workspace depends on this one and nothing here
//! depends on them.
//!
//! - YES principal identities and the well-known principals
//! - YES store identifiers and access mask vocabulary
//! - YES the unified [`VecsError`] type
//! - YES configuration types and validation
//! - YES effect traits (nonce generation, group membership, name resolution)
//! - NO security descriptor evaluation (that's `vecs-authorization`)
//! - NO session registry (that's `vecs-store`)
//! - NO effect handler implementations (that's `vecs-effects`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration types and loading
pub mod config;

/// Effect traits injected into the registry and ACL engine
pub mod effects;

/// Unified error type
pub mod errors;

/// Identifier and principal types
pub mod types;

pub use config::{ConfigValidation, LoggingConfig, RegistryConfig, ServiceConfig, VecsConfig};
pub use effects::{GroupMembership, NonceEffects, PrincipalResolver};
pub use errors::{Result, VecsError};
pub use types::access::{AccessMask, READ_STORE, WRITE_STORE};
pub use types::principal::{Principal, PrincipalKind, EVERYONE_NAME, ROOT_UID};
pub use types::store::StoreId;
