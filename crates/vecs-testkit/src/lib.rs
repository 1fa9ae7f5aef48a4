//! VECS Testing Infrastructure
//!
//! Deterministic stand-ins for the collaborators of the store registry and
//! ready-made fixtures built from them.
//!
//! Add this to a crate's `Cargo.toml` dev-dependencies:
//! ```toml
//! [dev-dependencies]
//! vecs-testkit = { workspace = true }
//! ```
//!
//! Then in tests:
//! ```rust,no_run
//! use vecs_testkit::*;
//!
//! let fixture = RegistryFixture::new();
//! let store = fixture.add_store("machine-ssl", &alice());
//! let handle = fixture.registry.open_store(store, &alice()).unwrap();
//! assert!(fixture.registry.is_valid_handle(&handle, &alice()));
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

pub mod catalog;
pub mod directory;
pub mod fixtures;
pub mod nonce;
pub mod strategies;

pub use catalog::MemoryCatalog;
pub use directory::StaticDirectory;
pub use fixtures::*;
pub use nonce::{FixedNonceHandler, MockNonceHandler};
