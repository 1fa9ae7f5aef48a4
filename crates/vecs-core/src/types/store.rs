//! Persistent store identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Result, VecsError};

/// Numeric identifier of a persistent certificate store
///
/// Resolved from a store name by the catalog. Zero is never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(u64);

impl StoreId {
    /// Wrap a raw id, rejecting zero
    pub fn new(raw: u64) -> Result<Self> {
        if raw == 0 {
            return Err(VecsError::invalid_argument("store id must be non-zero"));
        }
        Ok(Self(raw))
    }

    /// Raw numeric value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

impl TryFrom<u64> for StoreId {
    type Error = VecsError;

    fn try_from(raw: u64) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<StoreId> for u64 {
    fn from(id: StoreId) -> Self {
        id.0
    }
}
