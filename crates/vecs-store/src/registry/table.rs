//! Session table internals
//!
//! Slots are addressed by open addressing with linear probing. [`probe`] is
//! a pure function over the slot array so placement can be tested without
//! any locking.

use vecs_authorization::SecurityDescriptor;
use vecs_core::{Principal, Result, StoreId, VecsError};

use super::handle::{CloseOutcome, SessionSnapshot, SlotStatus};

/// One principal's share of a session
#[derive(Debug, Clone)]
pub(crate) struct Opener {
    principal: Principal,
    instance_bits: u32,
}

/// Cached state of one store while it sits in the table
#[derive(Debug, Clone)]
pub(crate) struct Session {
    store_id: StoreId,
    generation: u64,
    nonce: u64,
    status: SlotStatus,
    ref_count: u64,
    descriptor: SecurityDescriptor,
    openers: Vec<Opener>,
}

impl Session {
    /// Fresh session with a single handle held by `principal`
    pub(crate) fn open(
        store_id: StoreId,
        generation: u64,
        nonce: u64,
        descriptor: SecurityDescriptor,
        principal: &Principal,
    ) -> Result<Self> {
        let mut openers = Vec::new();
        openers.try_reserve(1)?;
        openers.push(Opener {
            principal: principal.clone(),
            instance_bits: 1,
        });
        Ok(Self {
            store_id,
            generation,
            nonce,
            status: SlotStatus::Open,
            ref_count: 1,
            descriptor,
            openers,
        })
    }

    pub(crate) fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub(crate) fn nonce(&self) -> u64 {
        self.nonce
    }

    pub(crate) fn status(&self) -> SlotStatus {
        self.status
    }

    pub(crate) fn ref_count(&self) -> u64 {
        self.ref_count
    }

    pub(crate) fn descriptor(&self) -> &SecurityDescriptor {
        &self.descriptor
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// True if this incarnation issued a handle carrying `generation` and `nonce`
    pub(crate) fn issued(&self, generation: u64, nonce: u64) -> bool {
        self.generation == generation && self.nonce == nonce
    }

    pub(crate) fn is_open_with(&self, generation: u64, nonce: u64) -> bool {
        self.status == SlotStatus::Open && self.issued(generation, nonce)
    }

    /// Swap the cached descriptor, handing back the previous one
    pub(crate) fn replace_descriptor(&mut self, descriptor: SecurityDescriptor) -> SecurityDescriptor {
        std::mem::replace(&mut self.descriptor, descriptor)
    }

    /// Bring a closed session back as a new incarnation
    pub(crate) fn reopen(&mut self, generation: u64, nonce: u64, principal: &Principal) -> Result<u32> {
        if self.status != SlotStatus::Closed {
            return Err(VecsError::internal("reopen of a session that is not closed"));
        }
        self.openers.try_reserve(1)?;
        self.openers.push(Opener {
            principal: principal.clone(),
            instance_bits: 1,
        });
        self.generation = generation;
        self.nonce = nonce;
        self.ref_count = 1;
        self.status = SlotStatus::Open;
        Ok(1)
    }

    /// Hand `principal` one more instance bit
    ///
    /// The bit is the lowest one not yet held by that principal among the
    /// first `max_instances` bits.
    pub(crate) fn add_instance(&mut self, principal: &Principal, max_instances: u32) -> Result<u32> {
        if let Some(opener) = self.openers.iter_mut().find(|o| &o.principal == principal) {
            let free = !opener.instance_bits & instance_limit(max_instances);
            if free == 0 {
                return Err(VecsError::no_capacity(format!(
                    "{principal} already holds {max_instances} handles on {}",
                    self.store_id
                )));
            }
            let bit = free & free.wrapping_neg();
            opener.instance_bits |= bit;
            self.ref_count += 1;
            return Ok(bit);
        }

        self.openers.try_reserve(1)?;
        self.openers.insert(
            0,
            Opener {
                principal: principal.clone(),
                instance_bits: 1,
            },
        );
        self.ref_count += 1;
        Ok(1)
    }

    /// True if `principal` currently holds `bit`
    pub(crate) fn holds(&self, principal: &Principal, bit: u32) -> bool {
        bit.is_power_of_two()
            && self
                .openers
                .iter()
                .any(|o| &o.principal == principal && o.instance_bits & bit != 0)
    }

    /// Give back one instance bit
    pub(crate) fn release_instance(&mut self, principal: &Principal, bit: u32) -> CloseOutcome {
        if self.status != SlotStatus::Open || !bit.is_power_of_two() {
            return CloseOutcome::Stale;
        }
        let Some(index) = self
            .openers
            .iter()
            .position(|o| &o.principal == principal && o.instance_bits & bit != 0)
        else {
            return CloseOutcome::Stale;
        };

        self.openers[index].instance_bits &= !bit;
        if self.openers[index].instance_bits == 0 {
            self.openers.remove(index);
        }
        self.ref_count = self.ref_count.saturating_sub(1);

        if self.ref_count == 0 {
            self.openers = Vec::new();
            self.status = SlotStatus::Closed;
            CloseOutcome::SessionClosed
        } else {
            CloseOutcome::Released
        }
    }

    /// Sum of held instance bits; equals the reference count
    pub(crate) fn held_instances(&self) -> u64 {
        self.openers
            .iter()
            .map(|o| u64::from(o.instance_bits.count_ones()))
            .sum()
    }

    pub(crate) fn snapshot(&self, slot: u32) -> SessionSnapshot {
        SessionSnapshot {
            slot,
            store_id: self.store_id,
            status: self.status,
            ref_count: self.ref_count,
            openers: self
                .openers
                .iter()
                .map(|o| (o.principal.to_string(), o.instance_bits))
                .collect(),
        }
    }
}

fn instance_limit(max_instances: u32) -> u32 {
    if max_instances >= u32::BITS {
        u32::MAX
    } else {
        (1u32 << max_instances) - 1
    }
}

/// One position in the table
///
/// The last nonce issued from a slot outlives the session that used it so
/// that the next incarnation is guaranteed a different one.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    pub(crate) session: Option<Session>,
    generation: u64,
}

impl Slot {
    /// Number the next incarnation started in this slot
    ///
    /// Generations only grow, so a handle from any earlier incarnation can
    /// never match again, whatever nonces are drawn.
    pub(crate) fn next_generation(&mut self) -> Result<u64> {
        self.generation = self
            .generation
            .checked_add(1)
            .ok_or_else(|| VecsError::internal("slot generation exhausted"))?;
        Ok(self.generation)
    }

    pub(crate) fn status(&self) -> SlotStatus {
        self.session
            .as_ref()
            .map_or(SlotStatus::Empty, Session::status)
    }
}

/// Where [`probe`] placed a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    /// The store already has a session in this slot
    Existing(usize),
    /// First empty slot on the probe path
    Vacant(usize),
    /// First closed slot of another store; its cache may be dropped
    Reclaim(usize),
}

/// Home slot of a store: `(store_id * multiplier) % table_size`
pub(crate) fn home_slot(store_id: StoreId, multiplier: u64, table_size: usize) -> usize {
    let product = u128::from(store_id.get()) * u128::from(multiplier);
    (product % table_size as u128) as usize
}

/// Find the slot a store lives in or should move into
///
/// The full cycle is walked so a live session is found even when an
/// earlier slot on its path has since been emptied by a delete.
pub(crate) fn probe(slots: &[Slot], store_id: StoreId, multiplier: u64) -> Result<Placement> {
    let size = slots.len();
    if size == 0 {
        return Err(VecsError::no_capacity("session table has no slots"));
    }
    let home = home_slot(store_id, multiplier, size);
    let mut first_empty = None;
    let mut first_closed = None;

    for step in 0..size {
        let index = (home + step) % size;
        match &slots[index].session {
            Some(session) if session.store_id == store_id => {
                return Ok(Placement::Existing(index));
            }
            Some(session) => {
                if session.status == SlotStatus::Closed && first_closed.is_none() {
                    first_closed = Some(index);
                }
            }
            None => {
                if first_empty.is_none() {
                    first_empty = Some(index);
                }
            }
        }
    }

    match (first_empty, first_closed) {
        (Some(index), _) => Ok(Placement::Vacant(index)),
        (None, Some(index)) => Ok(Placement::Reclaim(index)),
        (None, None) => Err(VecsError::no_capacity(format!(
            "all {size} session slots are open; cannot place {store_id}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecs_authorization::SecurityDescriptor;

    fn alice() -> Principal {
        Principal::user(1001, "alice")
    }

    fn id(raw: u64) -> StoreId {
        StoreId::new(raw).unwrap()
    }

    fn session(store: u64, status: SlotStatus) -> Session {
        let mut s = Session::open(
            id(store),
            1,
            store,
            SecurityDescriptor::init(&alice()).unwrap(),
            &alice(),
        )
        .unwrap();
        if status == SlotStatus::Closed {
            assert_eq!(s.release_instance(&alice(), 1), CloseOutcome::SessionClosed);
        }
        s
    }

    fn table(size: usize) -> Vec<Slot> {
        vec![Slot::default(); size]
    }

    #[test]
    fn home_slot_matches_reference_hash() {
        assert_eq!(home_slot(id(7), 67, 64), (7 * 67) % 64);
        assert_eq!(home_slot(id(u64::MAX), 67, 64), ((u64::MAX as u128 * 67) % 64) as usize);
    }

    #[test]
    fn probe_uses_home_slot_when_empty() {
        let slots = table(64);
        assert_eq!(probe(&slots, id(7), 67).unwrap(), Placement::Vacant(21));
    }

    #[test]
    fn probe_steps_past_collisions() {
        let mut slots = table(4);
        // 1 and 5 share home slot 1 with multiplier 1
        slots[1].session = Some(session(1, SlotStatus::Open));
        assert_eq!(probe(&slots, id(5), 1).unwrap(), Placement::Vacant(2));
        assert_eq!(probe(&slots, id(1), 1).unwrap(), Placement::Existing(1));
    }

    #[test]
    fn probe_finds_session_past_emptied_slot() {
        let mut slots = table(4);
        slots[2].session = Some(session(5, SlotStatus::Open));
        // slot 1 is empty again after a delete, store 5 still lives in 2
        assert_eq!(probe(&slots, id(5), 1).unwrap(), Placement::Existing(2));
    }

    #[test]
    fn probe_wraps_around() {
        let mut slots = table(4);
        slots[3].session = Some(session(3, SlotStatus::Open));
        assert_eq!(probe(&slots, id(7), 1).unwrap(), Placement::Vacant(0));
    }

    #[test]
    fn probe_reclaims_closed_slot_when_full() {
        let mut slots = table(3);
        slots[0].session = Some(session(3, SlotStatus::Open));
        slots[1].session = Some(session(4, SlotStatus::Closed));
        slots[2].session = Some(session(5, SlotStatus::Open));
        assert_eq!(probe(&slots, id(6), 1).unwrap(), Placement::Reclaim(1));
    }

    #[test]
    fn probe_fails_when_every_slot_is_open() {
        let mut slots = table(2);
        slots[0].session = Some(session(2, SlotStatus::Open));
        slots[1].session = Some(session(3, SlotStatus::Open));
        assert!(probe(&slots, id(4), 1).unwrap_err().is_no_capacity());
    }

    #[test]
    fn instance_bits_are_lowest_free() {
        let mut s = session(1, SlotStatus::Open);
        assert_eq!(s.add_instance(&alice(), 32).unwrap(), 2);
        assert_eq!(s.add_instance(&alice(), 32).unwrap(), 4);
        assert_eq!(s.release_instance(&alice(), 2), CloseOutcome::Released);
        assert_eq!(s.add_instance(&alice(), 32).unwrap(), 2);
        assert_eq!(s.ref_count(), 3);
        assert_eq!(s.held_instances(), 3);
    }

    #[test]
    fn instance_limit_is_enforced() {
        let mut s = session(1, SlotStatus::Open);
        assert_eq!(s.add_instance(&alice(), 2).unwrap(), 2);
        assert!(s.add_instance(&alice(), 2).unwrap_err().is_no_capacity());
        assert_eq!(s.ref_count(), 2);
    }

    #[test]
    fn new_opener_goes_first() {
        let mut s = session(1, SlotStatus::Open);
        let bob = Principal::user(1002, "bob");
        assert_eq!(s.add_instance(&bob, 32).unwrap(), 1);
        let snapshot = s.snapshot(0);
        assert_eq!(snapshot.openers[0].0, bob.to_string());
        assert_eq!(snapshot.ref_count, 2);
    }

    #[test]
    fn release_of_unheld_bit_is_stale() {
        let mut s = session(1, SlotStatus::Open);
        assert_eq!(s.release_instance(&alice(), 2), CloseOutcome::Stale);
        assert_eq!(s.release_instance(&alice(), 3), CloseOutcome::Stale);
        assert_eq!(
            s.release_instance(&Principal::user(1002, "bob"), 1),
            CloseOutcome::Stale
        );
        assert_eq!(s.ref_count(), 1);
    }

    #[test]
    fn last_release_closes_session() {
        let mut s = session(1, SlotStatus::Open);
        assert_eq!(s.release_instance(&alice(), 1), CloseOutcome::SessionClosed);
        assert_eq!(s.status(), SlotStatus::Closed);
        assert_eq!(s.release_instance(&alice(), 1), CloseOutcome::Stale);
        assert_eq!(s.ref_count(), 0);
    }
}
