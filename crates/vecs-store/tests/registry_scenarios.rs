//! Session registry behavior through its public surface

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::thread;

use assert_matches::assert_matches;
use vecs_authorization::{AceKind, ModifyMode};
use vecs_core::{RegistryConfig, VecsError, READ_STORE, WRITE_STORE};
use vecs_store::{CloseOutcome, SlotStatus};
use vecs_testkit::{alice, bob, carol, init_test_tracing, FixedNonceHandler, RegistryFixture};

#[test]
fn repeated_open_shares_nonce_and_counts_references() {
    init_test_tracing();
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());

    let first = fixture.registry.open_store(store, &alice()).unwrap();
    let second = fixture.registry.open_store(store, &alice()).unwrap();

    assert_eq!(first.instance_bit(), 1);
    assert_eq!(second.instance_bit(), 2);
    assert_eq!(first.nonce(), second.nonce());
    assert_eq!(fixture.registry.store_info(&second, &alice()).unwrap().ref_count, 2);
    assert_eq!(fixture.catalog.descriptor_loads(), 1);
}

#[test]
fn reader_acl_is_enforced_through_handles() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let owner = fixture.registry.open_store(store, &alice()).unwrap();

    let mut sd = fixture.registry.get_descriptor_snapshot(&owner).unwrap();
    sd.modify_permissions(&bob(), READ_STORE, AceKind::Allowed, ModifyMode::Set)
        .unwrap();
    fixture.registry.set_descriptor(&owner, &sd).unwrap();

    let reader = fixture.registry.open_store(store, &bob()).unwrap();
    fixture.registry.access_check(&reader, &bob(), READ_STORE).unwrap();
    assert!(fixture
        .registry
        .access_check(&reader, &bob(), WRITE_STORE)
        .unwrap_err()
        .is_access_denied());
}

#[test]
fn close_to_zero_then_delete_empties_slot() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let first = fixture.registry.open_store(store, &alice()).unwrap();
    let second = fixture.registry.open_store(store, &alice()).unwrap();

    assert!(!fixture.registry.can_delete(&first));
    assert_eq!(fixture.registry.close_handle(&second, &alice()), CloseOutcome::Released);
    assert!(fixture.registry.can_delete(&first));

    assert_eq!(
        fixture.registry.close_handle(&first, &alice()),
        CloseOutcome::SessionClosed
    );
    let sessions = fixture.registry.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SlotStatus::Closed);
    assert_eq!(sessions[0].ref_count, 0);

    fixture.registry.delete_session_entry(&first).unwrap();
    assert!(fixture.registry.sessions().is_empty());
}

#[test]
fn handles_die_with_their_session() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let handle = fixture.registry.open_store(store, &alice()).unwrap();
    fixture.registry.delete_session_entry(&handle).unwrap();

    assert!(!fixture.registry.is_valid_handle(&handle, &alice()));
    assert_matches!(
        fixture.registry.access_check(&handle, &alice(), READ_STORE),
        Err(VecsError::InvalidHandle { .. })
    );

    let reopened = fixture.registry.open_store(store, &alice()).unwrap();
    assert_eq!(reopened.slot(), handle.slot());
    assert!(!fixture.registry.is_valid_handle(&handle, &alice()));
}

#[test]
fn double_close_is_harmless() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let a = fixture.registry.open_store(store, &alice()).unwrap();
    fixture.registry.open_store(store, &bob()).unwrap();

    assert_eq!(fixture.registry.close_handle(&a, &alice()), CloseOutcome::Released);
    assert_eq!(fixture.registry.close_handle(&a, &alice()), CloseOutcome::Stale);
    assert_eq!(fixture.registry.store_info(&a, &alice()).ok(), None);
    assert_eq!(fixture.registry.stats().handles, 1);
    fixture.registry.verify_ref_counts().unwrap();
}

#[test]
fn reopen_after_close_issues_new_nonce() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let old = fixture.registry.open_store(store, &alice()).unwrap();
    fixture.registry.close_handle(&old, &alice());

    let new = fixture.registry.open_store(store, &bob()).unwrap();
    assert_eq!(new.slot(), old.slot());
    assert_ne!(new.nonce(), old.nonce());
    assert!(new.generation() > old.generation());
    assert!(!fixture.registry.is_valid_handle(&old, &alice()));
    // the cached descriptor was kept across the close
    assert_eq!(fixture.catalog.descriptor_loads(), 1);
}

#[test]
fn repeating_nonce_source_never_revives_old_handles() {
    let fixture =
        RegistryFixture::with_nonces(RegistryConfig::default(), Arc::new(FixedNonceHandler(42)));
    let store = fixture.add_store_with_id(7, &alice());

    let mut earlier = Vec::new();
    for _ in 0..3 {
        let handle = fixture.registry.open_store(store, &alice()).unwrap();
        assert_eq!(handle.nonce(), 42);
        assert!(earlier
            .iter()
            .all(|old| !fixture.registry.is_valid_handle(old, &alice())));
        fixture.registry.close_handle(&handle, &alice());
        earlier.push(handle);
    }

    let live = fixture.registry.open_store(store, &alice()).unwrap();
    for old in &earlier {
        assert_eq!(fixture.registry.close_handle(old, &alice()), CloseOutcome::Stale);
    }
    assert!(fixture.registry.is_valid_handle(&live, &alice()));
    fixture.registry.verify_ref_counts().unwrap();
}

#[test]
fn full_table_rejects_new_store_until_a_slot_closes() {
    let fixture = RegistryFixture::with_config(RegistryConfig {
        table_size: 4,
        ..RegistryConfig::default()
    });
    let handles: Vec<_> = (1..=4)
        .map(|id| {
            let store = fixture.add_store_with_id(id, &alice());
            fixture.registry.open_store(store, &alice()).unwrap()
        })
        .collect();

    let extra = fixture.add_store_with_id(5, &alice());
    assert!(fixture
        .registry
        .open_store(extra, &alice())
        .unwrap_err()
        .is_no_capacity());

    fixture.registry.close_handle(&handles[2], &alice());
    let reclaimed = fixture.registry.open_store(extra, &alice()).unwrap();
    assert_eq!(reclaimed.slot(), handles[2].slot());
    assert!(!fixture.registry.is_valid_handle(&handles[2], &alice()));
    assert_eq!(fixture.registry.stats().open, 4);
}

#[test]
fn thirty_third_open_is_refused() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let bits: Vec<u32> = (0..32)
        .map(|_| fixture.registry.open_store(store, &alice()).unwrap().instance_bit())
        .collect();

    assert!(bits.iter().all(|bit| bit.is_power_of_two()));
    assert_eq!(bits.iter().fold(0u32, |acc, bit| acc | bit), u32::MAX);

    let err = fixture.registry.open_store(store, &alice()).unwrap_err();
    assert!(err.is_no_capacity());
    let info = fixture.registry.sessions();
    assert_eq!(info[0].ref_count, 32);

    // a different principal still gets in
    assert_eq!(fixture.registry.open_store(store, &bob()).unwrap().instance_bit(), 1);
}

#[test]
fn failed_persist_keeps_cache() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let handle = fixture.registry.open_store(store, &alice()).unwrap();
    let before = fixture.registry.get_descriptor_snapshot(&handle).unwrap();

    let mut changed = before.clone();
    changed
        .modify_permissions(&carol(), WRITE_STORE, AceKind::Allowed, ModifyMode::Set)
        .unwrap();
    fixture.catalog.fail_writes(true);

    assert!(fixture.registry.set_descriptor(&handle, &changed).is_err());
    assert_eq!(fixture.registry.get_descriptor_snapshot(&handle).unwrap(), before);
    assert_eq!(fixture.catalog.persisted_descriptor(store).unwrap(), before);
}

#[test]
fn snapshot_is_independent_of_cache() {
    let fixture = RegistryFixture::new();
    let store = fixture.add_store_with_id(7, &alice());
    let handle = fixture.registry.open_store(store, &alice()).unwrap();

    let mut snapshot = fixture.registry.get_descriptor_snapshot(&handle).unwrap();
    snapshot
        .modify_permissions(&bob(), READ_STORE, AceKind::Allowed, ModifyMode::Set)
        .unwrap();
    assert!(fixture
        .registry
        .get_descriptor_snapshot(&handle)
        .unwrap()
        .acl()
        .is_empty());

    fixture.registry.set_descriptor(&handle, &snapshot).unwrap();
    let round_trip = fixture.registry.get_descriptor_snapshot(&handle).unwrap();
    assert_eq!(round_trip, snapshot);
}

#[test]
fn concurrent_opens_create_one_session() {
    let fixture = Arc::new(RegistryFixture::new());
    let store = fixture.add_store_with_id(7, &alice());
    let principals = [alice(), bob(), carol()];

    let workers: Vec<_> = (0..12)
        .map(|i| {
            let fixture = Arc::clone(&fixture);
            let principal = principals[i % principals.len()].clone();
            thread::spawn(move || {
                (0..4)
                    .map(|_| fixture.registry.open_store(store, &principal).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let handles: Vec<_> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();

    assert_eq!(handles.len(), 48);
    assert_eq!(fixture.catalog.descriptor_loads(), 1);
    let sessions = fixture.registry.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].ref_count, 48);
    assert!(handles.iter().all(|h| h.nonce() == handles[0].nonce()));
    fixture.registry.verify_ref_counts().unwrap();
}

#[test]
fn concurrent_open_and_close_keeps_counts_consistent() {
    let fixture = Arc::new(RegistryFixture::new());
    let store = fixture.add_store_with_id(7, &alice());
    let keeper = fixture.registry.open_store(store, &alice()).unwrap();

    let workers: Vec<_> = [bob(), carol()]
        .into_iter()
        .map(|principal| {
            let fixture = Arc::clone(&fixture);
            thread::spawn(move || {
                for _ in 0..50 {
                    let handle = fixture.registry.open_store(store, &principal).unwrap();
                    fixture.registry.access_check(&handle, &principal, READ_STORE).ok();
                    assert_ne!(
                        fixture.registry.close_handle(&handle, &principal),
                        CloseOutcome::Stale
                    );
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(fixture.registry.store_info(&keeper, &alice()).unwrap().ref_count, 1);
    fixture.registry.verify_ref_counts().unwrap();
}

#[test]
fn teardown_releases_everything() {
    let fixture = RegistryFixture::new();
    for id in 1..=5 {
        let store = fixture.add_store_with_id(id, &alice());
        fixture.registry.open_store(store, &alice()).unwrap();
    }
    assert_eq!(fixture.registry.teardown_all(), 5);
    assert_eq!(fixture.registry.stats().empty, 64);
}
