//! # VECS Effects - Layer 3: Production Handlers
//!
//! Stateless, single-purpose implementations of the effect traits declared
//! in `vecs-core`, for use by the store service host process.
//!
//! - [`RealNonceHandler`]: session nonces from the thread-local CSPRNG
//! - [`WellKnownGroups`]: membership in the everyone group only
//! - [`AccountsDirectory`]: name and group lookup through the host's account databases
//! - [`logging::init_tracing`]: `tracing-subscriber` setup
//!
//! Deterministic test doubles live in `vecs-testkit`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Account and group lookup
pub mod identity;

/// Log subscriber setup
pub mod logging;

/// Session nonce generation
pub mod random;

pub use identity::{AccountsDirectory, WellKnownGroups};
pub use random::RealNonceHandler;
