//! # VECS Store - Layer 2: Store Sessions
//!
//! **Purpose**: Let many mutually distrusting connections share a small
//! number of persistent certificate stores through opaque handles.
//!
//! - YES fixed-size session table keyed by store id ([`StoreRegistry`])
//! - YES per-principal instance bits and reference counting
//! - YES handle validation and access checks ([`StoreRegistry::access_check`])
//! - YES authenticated store operations ([`StoreAuthService`])
//! - NO persistence (reached through [`DescriptorCatalog`] / [`StoreLifecycle`])
//! - NO wire marshaling or credential authentication
//!
//! ## Locking
//!
//! The whole table sits behind one `parking_lot::RwLock`. Validation,
//! snapshots and access checks take the read lock. Opening, closing,
//! descriptor replacement, deletion and teardown take the write lock.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Persistent catalog collaborators
pub mod catalog;

/// Store session registry
pub mod registry;

/// Authenticated store operations
pub mod service;

pub use catalog::{DescriptorCatalog, StoreLifecycle};
pub use registry::{
    CloseOutcome, RegistryStats, SessionSnapshot, SlotStatus, StoreHandle, StoreInfo,
    StoreRegistry,
};
pub use service::StoreAuthService;
