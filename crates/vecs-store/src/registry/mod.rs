//! Store session registry
//!
//! A fixed-size table of store sessions shared by every connection in the
//! process. Opening a store that already has a session joins that session;
//! the descriptor is loaded from the catalog only when a store enters the
//! table. Each principal holds up to `max_instances_per_principal` handles
//! on a session, one instance bit per handle.
//!
//! ## Slot lifecycle
//!
//! ```text
//! Empty --open--> Open --last close--> Closed --delete--> Empty
//!                  ^                     |
//!                  +-------reopen--------+   (new generation)
//! ```
//!
//! A closed slot keeps its cached descriptor and may be reused by its store
//! or, when no slot on the probe path is empty, reclaimed by another store.

mod access;
mod handle;
mod table;

use parking_lot::RwLock;
use std::sync::Arc;

use vecs_authorization::SecurityDescriptor;
use vecs_core::{
    ConfigValidation, GroupMembership, NonceEffects, Principal, RegistryConfig, Result, StoreId,
    VecsError,
};

use crate::catalog::DescriptorCatalog;

pub use handle::{CloseOutcome, RegistryStats, SessionSnapshot, SlotStatus, StoreHandle, StoreInfo};

use table::{probe, Placement, Session, Slot};

/// Process-wide table of store sessions
pub struct StoreRegistry {
    slots: RwLock<Vec<Slot>>,
    config: RegistryConfig,
    catalog: Arc<dyn DescriptorCatalog>,
    nonces: Arc<dyn NonceEffects>,
    membership: Arc<dyn GroupMembership>,
}

impl StoreRegistry {
    /// Create an empty registry
    pub fn new(
        config: RegistryConfig,
        catalog: Arc<dyn DescriptorCatalog>,
        nonces: Arc<dyn NonceEffects>,
        membership: Arc<dyn GroupMembership>,
    ) -> Result<Self> {
        config.validate()?;
        let mut slots = Vec::new();
        slots.try_reserve_exact(config.table_size)?;
        slots.resize_with(config.table_size, Slot::default);
        tracing::debug!(
            table_size = config.table_size,
            max_instances = config.max_instances_per_principal,
            "store registry created"
        );
        Ok(Self {
            slots: RwLock::new(slots),
            config,
            catalog,
            nonces,
            membership,
        })
    }

    /// Sizing this registry was built with
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Open `store_id` on behalf of `principal`
    ///
    /// Joins the store's session if it has one. Otherwise loads the
    /// descriptor from the catalog and starts a session in the slot chosen
    /// by probing. Catalog errors are returned unchanged and leave the
    /// table untouched.
    pub fn open_store(&self, store_id: StoreId, principal: &Principal) -> Result<StoreHandle> {
        principal.validate()?;
        let mut slots = self.slots.write();

        let placement = probe(&slots, store_id, self.config.hash_multiplier)?;
        let index = match placement {
            Placement::Existing(index) | Placement::Vacant(index) | Placement::Reclaim(index) => {
                index
            }
        };
        let position = slot_number(index)?;
        let slot = slots
            .get_mut(index)
            .ok_or_else(|| VecsError::internal("probe returned a slot outside the table"))?;

        match placement {
            Placement::Existing(_) => {
                let handle = match slot.status() {
                    SlotStatus::Open => {
                        let session = slot
                            .session
                            .as_mut()
                            .ok_or_else(|| VecsError::internal("open slot without a session"))?;
                        let bit = session
                            .add_instance(principal, self.config.max_instances_per_principal)?;
                        StoreHandle::new(position, bit, session.generation(), session.nonce())
                    }
                    SlotStatus::Closed => {
                        let generation = slot.next_generation()?;
                        let nonce = self.nonces.session_nonce();
                        let session = slot
                            .session
                            .as_mut()
                            .ok_or_else(|| VecsError::internal("closed slot without a session"))?;
                        let bit = session.reopen(generation, nonce, principal)?;
                        tracing::info!(%store_id, slot = index, generation, "store session reopened");
                        StoreHandle::new(position, bit, generation, nonce)
                    }
                    SlotStatus::Empty => {
                        return Err(VecsError::internal("probe matched an empty slot"))
                    }
                };
                tracing::debug!(%store_id, %principal, %handle, "store opened");
                Ok(handle)
            }
            Placement::Vacant(_) | Placement::Reclaim(_) => {
                let descriptor = self.catalog.get_security_descriptor(store_id)?;
                let generation = slot.next_generation()?;
                let nonce = self.nonces.session_nonce();
                let session = Session::open(store_id, generation, nonce, descriptor, principal)?;
                if let Some(evicted) = slot.session.replace(session) {
                    tracing::info!(
                        evicted = %evicted.store_id(),
                        %store_id,
                        slot = index,
                        "reclaimed closed session slot"
                    );
                }
                let handle = StoreHandle::new(position, 1, generation, nonce);
                tracing::info!(%store_id, %principal, slot = index, "store session created");
                Ok(handle)
            }
        }
    }

    /// Release one handle
    ///
    /// Closing a handle that is already closed, was issued by an earlier
    /// incarnation, or belongs to someone else changes nothing and reports
    /// [`CloseOutcome::Stale`].
    pub fn close_handle(&self, handle: &StoreHandle, principal: &Principal) -> CloseOutcome {
        let mut slots = self.slots.write();
        let outcome = match slots
            .get_mut(handle.slot_index())
            .and_then(|slot| slot.session.as_mut())
        {
            Some(session) if session.issued(handle.generation(), handle.nonce()) => {
                session.release_instance(principal, handle.instance_bit())
            }
            _ => CloseOutcome::Stale,
        };

        match outcome {
            CloseOutcome::Released => {
                tracing::debug!(%principal, %handle, "store handle closed");
            }
            CloseOutcome::SessionClosed => {
                tracing::info!(%principal, slot = handle.slot(), "store session closed");
            }
            CloseOutcome::Stale => {
                tracing::warn!(%principal, %handle, "close of stale or foreign handle ignored");
            }
        }
        outcome
    }

    /// True if `handle` is open, current, and held by `principal`
    pub fn is_valid_handle(&self, handle: &StoreHandle, principal: &Principal) -> bool {
        let slots = self.slots.read();
        validated(&slots, handle, principal).is_ok()
    }

    /// Deep copy of the cached descriptor
    pub fn get_descriptor_snapshot(&self, handle: &StoreHandle) -> Result<SecurityDescriptor> {
        let slots = self.slots.read();
        Ok(current(&slots, handle)?.descriptor().clone())
    }

    /// Persist `descriptor` and make it the cached copy
    ///
    /// The cache is only replaced after the catalog accepted the write; on
    /// failure the previous descriptor stays in place.
    pub fn set_descriptor(&self, handle: &StoreHandle, descriptor: &SecurityDescriptor) -> Result<()> {
        let replacement = descriptor.clone();
        let mut slots = self.slots.write();
        let session = current_mut(&mut slots, handle)?;
        let store_id = session.store_id();

        if let Err(error) = self.catalog.set_security_descriptor(store_id, &replacement) {
            tracing::error!(%store_id, %error, "failed to persist security descriptor");
            return Err(error);
        }
        let previous = session.replace_descriptor(replacement);
        drop(slots);
        drop(previous);
        tracing::debug!(%store_id, "security descriptor replaced");
        Ok(())
    }

    /// True if `handle` is the only open reference to its store
    pub fn can_delete(&self, handle: &StoreHandle) -> bool {
        let slots = self.slots.read();
        current(&slots, handle).is_ok_and(|session| session.ref_count() == 1)
    }

    /// Drop the session behind `handle` and empty its slot
    ///
    /// The handle must name the slot's current incarnation, open or closed.
    pub fn delete_session_entry(&self, handle: &StoreHandle) -> Result<()> {
        let mut slots = self.slots.write();
        let slot = slots
            .get_mut(handle.slot_index())
            .ok_or_else(|| VecsError::invalid_handle(format!("no slot {}", handle.slot())))?;
        let matches = slot
            .session
            .as_ref()
            .is_some_and(|session| session.issued(handle.generation(), handle.nonce()));
        if !matches {
            return Err(VecsError::invalid_handle(format!(
                "{handle} does not name a live session"
            )));
        }
        if let Some(session) = slot.session.take() {
            tracing::info!(store_id = %session.store_id(), slot = handle.slot(), "store session deleted");
        }
        Ok(())
    }

    /// Remove a store that `handle` is the only open reference to
    ///
    /// `remove` deletes the store from the catalog. It runs with the table
    /// write locked, so no open can join the session between the reference
    /// check and the slot reset. When `remove` fails the session is kept.
    pub fn delete_exclusive<F>(&self, handle: &StoreHandle, remove: F) -> Result<()>
    where
        F: FnOnce(StoreId) -> Result<()>,
    {
        let mut slots = self.slots.write();
        let session = current(&slots, handle)?;
        let store_id = session.store_id();
        if session.ref_count() != 1 {
            return Err(VecsError::busy(format!(
                "{store_id} has {} open handles",
                session.ref_count()
            )));
        }

        remove(store_id)?;
        if let Some(slot) = slots.get_mut(handle.slot_index()) {
            slot.session = None;
        }
        tracing::info!(%store_id, slot = handle.slot(), "store session deleted");
        Ok(())
    }

    /// Release every session; returns how many were released
    pub fn teardown_all(&self) -> usize {
        let mut slots = self.slots.write();
        let released = slots
            .iter_mut()
            .filter_map(|slot| slot.session.take())
            .count();
        tracing::info!(released, "store registry torn down");
        released
    }

    /// Store id and reference count behind a valid handle
    pub fn store_info(&self, handle: &StoreHandle, principal: &Principal) -> Result<StoreInfo> {
        let slots = self.slots.read();
        let session = validated(&slots, handle, principal)?;
        Ok(StoreInfo {
            store_id: session.store_id(),
            ref_count: session.ref_count(),
        })
    }

    /// View of the session a handle was issued by, if it is still current
    pub fn session_snapshot(&self, handle: &StoreHandle) -> Option<SessionSnapshot> {
        let slots = self.slots.read();
        current(&slots, handle)
            .ok()
            .map(|session| session.snapshot(handle.slot()))
    }

    /// Views of every open or closed session in slot order
    pub fn sessions(&self) -> Vec<SessionSnapshot> {
        let slots = self.slots.read();
        slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let session = slot.session.as_ref()?;
                Some(session.snapshot(u32::try_from(index).ok()?))
            })
            .collect()
    }

    /// Slot and handle counts
    pub fn stats(&self) -> RegistryStats {
        let slots = self.slots.read();
        slots
            .iter()
            .fold(RegistryStats::default(), |mut stats, slot| {
                match slot.status() {
                    SlotStatus::Empty => stats.empty += 1,
                    SlotStatus::Open => stats.open += 1,
                    SlotStatus::Closed => stats.closed += 1,
                }
                stats.handles += slot.session.as_ref().map_or(0, Session::ref_count);
                stats
            })
    }

    /// Check that every session's reference count equals its held bits
    pub fn verify_ref_counts(&self) -> Result<()> {
        let slots = self.slots.read();
        for (index, session) in slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| Some((index, slot.session.as_ref()?)))
        {
            if session.ref_count() != session.held_instances() {
                return Err(VecsError::internal(format!(
                    "slot {index}: ref count {} but {} instance bits held",
                    session.ref_count(),
                    session.held_instances()
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRegistry")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

fn slot_number(index: usize) -> Result<u32> {
    u32::try_from(index).map_err(|_| VecsError::internal("slot index exceeds 32 bits"))
}

/// Open session of the incarnation that issued the handle
fn current<'a>(slots: &'a [Slot], handle: &StoreHandle) -> Result<&'a Session> {
    slots
        .get(handle.slot_index())
        .and_then(|slot| slot.session.as_ref())
        .filter(|session| session.is_open_with(handle.generation(), handle.nonce()))
        .ok_or_else(|| VecsError::invalid_handle(format!("{handle} is not open")))
}

fn current_mut<'a>(slots: &'a mut [Slot], handle: &StoreHandle) -> Result<&'a mut Session> {
    slots
        .get_mut(handle.slot_index())
        .and_then(|slot| slot.session.as_mut())
        .filter(|session| session.is_open_with(handle.generation(), handle.nonce()))
        .ok_or_else(|| VecsError::invalid_handle(format!("{handle} is not open")))
}

/// [`current`] plus proof that `principal` holds the handle's instance bit
fn validated<'a>(
    slots: &'a [Slot],
    handle: &StoreHandle,
    principal: &Principal,
) -> Result<&'a Session> {
    let session = current(slots, handle)?;
    if !session.holds(principal, handle.instance_bit()) {
        return Err(VecsError::invalid_handle(format!(
            "{principal} does not hold {handle}"
        )));
    }
    Ok(session)
}
