//! Persistent catalog collaborators
//!
//! The catalog knows which stores exist and keeps their security
//! descriptors on disk. The registry only reaches it through these traits.

use std::sync::Arc;

use vecs_authorization::SecurityDescriptor;
use vecs_core::{Result, StoreId};

/// Store name resolution and descriptor persistence
pub trait DescriptorCatalog: Send + Sync {
    /// Resolve a store name, checking the password of protected stores
    fn get_cert_store_id(&self, name: &str, password: Option<&str>) -> Result<StoreId>;

    /// Load the persisted descriptor of a store
    fn get_security_descriptor(&self, store_id: StoreId) -> Result<SecurityDescriptor>;

    /// Persist a descriptor for a store
    fn set_security_descriptor(
        &self,
        store_id: StoreId,
        descriptor: &SecurityDescriptor,
    ) -> Result<()>;
}

/// Store creation and removal
pub trait StoreLifecycle: Send + Sync {
    /// Create an empty store; `AlreadyExists` if the name is taken
    fn create_cert_store(&self, name: &str, password: Option<&str>) -> Result<StoreId>;

    /// Remove a store and everything in it
    fn delete_cert_store(&self, name: &str) -> Result<()>;
}

impl<T: DescriptorCatalog + ?Sized> DescriptorCatalog for Arc<T> {
    fn get_cert_store_id(&self, name: &str, password: Option<&str>) -> Result<StoreId> {
        (**self).get_cert_store_id(name, password)
    }

    fn get_security_descriptor(&self, store_id: StoreId) -> Result<SecurityDescriptor> {
        (**self).get_security_descriptor(store_id)
    }

    fn set_security_descriptor(
        &self,
        store_id: StoreId,
        descriptor: &SecurityDescriptor,
    ) -> Result<()> {
        (**self).set_security_descriptor(store_id, descriptor)
    }
}

impl<T: StoreLifecycle + ?Sized> StoreLifecycle for Arc<T> {
    fn create_cert_store(&self, name: &str, password: Option<&str>) -> Result<StoreId> {
        (**self).create_cert_store(name, password)
    }

    fn delete_cert_store(&self, name: &str) -> Result<()> {
        (**self).delete_cert_store(name)
    }
}
