//! Identifier and principal types shared across the workspace

/// Access mask vocabulary
pub mod access;

/// Authenticated principals and well-known identities
pub mod principal;

/// Persistent store identifiers
pub mod store;
