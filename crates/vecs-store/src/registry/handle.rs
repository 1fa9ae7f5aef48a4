//! Handles and read-only views of the session table

use serde::{Deserialize, Serialize};
use std::fmt;

use vecs_core::StoreId;

/// Opaque capability for one open instance of a store
///
/// A handle names a table slot, the instance bit its holder was given, and
/// the generation and nonce of the session incarnation that issued it.
/// Every incarnation of a slot gets a higher generation, so once the issuing
/// incarnation ends the handle is dead for good, even if the same store
/// later reopens in the same slot under the same nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreHandle {
    slot: u32,
    instance_bit: u32,
    generation: u64,
    nonce: u64,
}

impl StoreHandle {
    pub(crate) fn new(slot: u32, instance_bit: u32, generation: u64, nonce: u64) -> Self {
        Self {
            slot,
            instance_bit,
            generation,
            nonce,
        }
    }

    /// Rebuild a handle that crossed a process boundary
    ///
    /// Nothing is checked here; the registry validates handles on use.
    pub fn from_raw(slot: u32, instance_bit: u32, generation: u64, nonce: u64) -> Self {
        Self::new(slot, instance_bit, generation, nonce)
    }

    /// Index into the session table
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Single bit identifying this instance among the holder's handles
    pub fn instance_bit(&self) -> u32 {
        self.instance_bit
    }

    /// Slot generation of the session that issued the handle
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Random nonce of the session that issued the handle
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub(crate) fn slot_index(&self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for StoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot {} bit {:#x} gen {} nonce {:016x}",
            self.slot, self.instance_bit, self.generation, self.nonce
        )
    }
}

/// Result of closing a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloseOutcome {
    /// The instance was released; other handles keep the session open
    Released,
    /// The last handle was released and the session is now closed
    SessionClosed,
    /// The handle was already closed or never valid; nothing changed
    Stale,
}

/// Lifecycle state of a table slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotStatus {
    /// Never used, or released by a store delete
    Empty,
    /// Holds a session with at least one open handle
    Open,
    /// Holds a cached session with no open handles
    Closed,
}

/// Store and reference count behind a valid handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreInfo {
    /// Store the handle refers to
    pub store_id: StoreId,
    /// Open handles across all principals
    pub ref_count: u64,
}

/// Point-in-time view of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Table slot holding the session
    pub slot: u32,
    /// Store the session caches
    pub store_id: StoreId,
    /// Open or closed
    pub status: SlotStatus,
    /// Open handles across all principals
    pub ref_count: u64,
    /// Held instance bits per opener, most recent opener first
    pub openers: Vec<(String, u32)>,
}

/// Slot and handle counts across the whole table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Slots with open sessions
    pub open: usize,
    /// Slots with closed, cached sessions
    pub closed: usize,
    /// Unused slots
    pub empty: usize,
    /// Open handles summed over every session
    pub handles: u64,
}
