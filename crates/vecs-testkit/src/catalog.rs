//! In-memory store catalog
//!
//! Keeps store names, passwords and persisted descriptors in maps. Writes
//! can be made to fail on demand, and descriptor loads are counted so tests
//! can tell how often the registry went to the catalog.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use vecs_authorization::SecurityDescriptor;
use vecs_core::{Principal, Result, StoreId, VecsError};
use vecs_store::{DescriptorCatalog, StoreLifecycle};

#[derive(Debug, Clone)]
struct StoreRecord {
    id: StoreId,
    password: Option<String>,
}

#[derive(Debug)]
struct CatalogState {
    next_id: u64,
    stores: HashMap<String, StoreRecord>,
    descriptors: HashMap<StoreId, SecurityDescriptor>,
}

/// Catalog backed by process memory
#[derive(Debug)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
    fail_writes: AtomicBool,
    descriptor_loads: AtomicUsize,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    /// Empty catalog; ids start at 1
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CatalogState {
                next_id: 1,
                stores: HashMap::new(),
                descriptors: HashMap::new(),
            }),
            fail_writes: AtomicBool::new(false),
            descriptor_loads: AtomicUsize::new(0),
        }
    }

    /// Create a named store owned by `owner` with an empty ACL
    pub fn add_store(&self, name: &str, owner: &Principal) -> StoreId {
        let id = self.create_cert_store(name, None).unwrap();
        self.put_descriptor(id, SecurityDescriptor::with_revision(owner, 1).unwrap());
        id
    }

    /// Store `descriptor` for `id` as if it had been persisted
    pub fn put_descriptor(&self, id: StoreId, mut descriptor: SecurityDescriptor) {
        descriptor.mark_persisted();
        self.state.lock().descriptors.insert(id, descriptor);
    }

    /// The descriptor as last written
    pub fn persisted_descriptor(&self, id: StoreId) -> Option<SecurityDescriptor> {
        self.state.lock().descriptors.get(&id).cloned()
    }

    /// True if a store with this name exists
    pub fn contains_store(&self, name: &str) -> bool {
        self.state.lock().stores.contains_key(name)
    }

    /// Make every following descriptor write fail with a storage error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of descriptor loads served so far
    pub fn descriptor_loads(&self) -> usize {
        self.descriptor_loads.load(Ordering::SeqCst)
    }
}

impl DescriptorCatalog for MemoryCatalog {
    /// A password is only checked when the caller supplies one
    fn get_cert_store_id(&self, name: &str, password: Option<&str>) -> Result<StoreId> {
        let state = self.state.lock();
        let record = state
            .stores
            .get(name)
            .ok_or_else(|| VecsError::not_found(format!("store {name}")))?;
        if let (Some(given), Some(expected)) = (password, record.password.as_deref()) {
            if given != expected {
                return Err(VecsError::access_denied(format!("wrong password for store {name}")));
            }
        }
        Ok(record.id)
    }

    fn get_security_descriptor(&self, store_id: StoreId) -> Result<SecurityDescriptor> {
        self.descriptor_loads.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .descriptors
            .get(&store_id)
            .cloned()
            .ok_or_else(|| VecsError::not_found(format!("descriptor for {store_id}")))
    }

    fn set_security_descriptor(
        &self,
        store_id: StoreId,
        descriptor: &SecurityDescriptor,
    ) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(VecsError::storage(format!("injected write failure for {store_id}")));
        }
        let mut persisted = descriptor.clone();
        persisted.mark_persisted();
        self.state.lock().descriptors.insert(store_id, persisted);
        tracing::trace!(%store_id, "descriptor written to memory catalog");
        Ok(())
    }
}

impl StoreLifecycle for MemoryCatalog {
    fn create_cert_store(&self, name: &str, password: Option<&str>) -> Result<StoreId> {
        let mut state = self.state.lock();
        if state.stores.contains_key(name) {
            return Err(VecsError::already_exists(format!("store {name}")));
        }
        let id = StoreId::new(state.next_id)?;
        state.next_id += 1;
        state.stores.insert(
            name.to_string(),
            StoreRecord {
                id,
                password: password.map(str::to_string),
            },
        );
        Ok(id)
    }

    fn delete_cert_store(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock();
        let record = state
            .stores
            .remove(name)
            .ok_or_else(|| VecsError::not_found(format!("store {name}")))?;
        state.descriptors.remove(&record.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_map_to_increasing_ids() {
        let catalog = MemoryCatalog::new();
        let owner = Principal::user(1001, "alice");
        let first = catalog.add_store("trusted-roots", &owner);
        let second = catalog.add_store("machine-ssl", &owner);
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert_eq!(catalog.get_cert_store_id("machine-ssl", None).unwrap(), second);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let catalog = MemoryCatalog::new();
        catalog.create_cert_store("s", None).unwrap();
        let err = catalog.create_cert_store("s", None).unwrap_err();
        assert_eq!(err.code(), "already_exists");
    }

    #[test]
    fn wrong_password_is_denied() {
        let catalog = MemoryCatalog::new();
        catalog.create_cert_store("s", Some("secret")).unwrap();
        assert!(catalog.get_cert_store_id("s", Some("guess")).unwrap_err().is_access_denied());
        assert!(catalog.get_cert_store_id("s", Some("secret")).is_ok());
    }

    #[test]
    fn injected_failure_keeps_old_descriptor() {
        let catalog = MemoryCatalog::new();
        let alice = Principal::user(1001, "alice");
        let id = catalog.add_store("s", &alice);
        catalog.fail_writes(true);

        let replacement = SecurityDescriptor::with_revision(&Principal::user(1002, "bob"), 1).unwrap();
        assert!(catalog.set_security_descriptor(id, &replacement).is_err());
        assert_eq!(catalog.persisted_descriptor(id).unwrap().owner(), &alice);
    }
}
