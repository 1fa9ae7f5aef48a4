//! Authenticated store operations
//!
//! [`StoreAuthService`] is what the dispatch layer calls once it has
//! authenticated a connection. It resolves store and account names, holds
//! the ownership rules for destructive and administrative operations, and
//! drives the registry.

use parking_lot::Mutex;
use std::sync::Arc;

use vecs_authorization::{AceKind, ModifyMode, SecurityDescriptor};
use vecs_core::types::access::describe_mask;
use vecs_core::{
    AccessMask, ConfigValidation, GroupMembership, NonceEffects, Principal, PrincipalResolver,
    Result, ServiceConfig, StoreId, VecsConfig, VecsError,
};

use crate::catalog::{DescriptorCatalog, StoreLifecycle};
use crate::registry::{CloseOutcome, StoreHandle, StoreRegistry};

/// Revision written into descriptors of newly created stores
const INITIAL_DESCRIPTOR_REVISION: u32 = 1;

/// Store operations on behalf of authenticated callers
pub struct StoreAuthService {
    registry: StoreRegistry,
    catalog: Arc<dyn DescriptorCatalog>,
    lifecycle: Arc<dyn StoreLifecycle>,
    resolver: Arc<dyn PrincipalResolver>,
    config: ServiceConfig,
    create_lock: Mutex<()>,
    state_lock: Mutex<()>,
}

impl StoreAuthService {
    /// Build the service and its registry
    pub fn new<C>(
        config: &VecsConfig,
        catalog: Arc<C>,
        nonces: Arc<dyn NonceEffects>,
        membership: Arc<dyn GroupMembership>,
        resolver: Arc<dyn PrincipalResolver>,
    ) -> Result<Self>
    where
        C: DescriptorCatalog + StoreLifecycle + 'static,
    {
        config.validate()?;
        let registry = StoreRegistry::new(config.registry.clone(), catalog.clone(), nonces, membership)?;
        Ok(Self {
            registry,
            catalog: catalog.clone(),
            lifecycle: catalog,
            resolver,
            config: config.service.clone(),
            create_lock: Mutex::new(()),
            state_lock: Mutex::new(()),
        })
    }

    /// The underlying session registry
    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    /// Create a store owned by `caller` and open it
    ///
    /// If anything after the catalog entry was created fails, the entry is
    /// removed again. A name that is already taken is reported as
    /// `AlreadyExists` and the existing store is left alone.
    pub fn create_store(
        &self,
        name: &str,
        password: Option<&str>,
        caller: &Principal,
    ) -> Result<StoreHandle> {
        require_store_name(name)?;
        caller.validate()?;
        let _guard = self.create_lock.lock();

        let store_id = self.lifecycle.create_cert_store(name, password)?;
        match self.initialize_store(store_id, caller) {
            Ok(handle) => {
                tracing::info!(store = name, %store_id, owner = %caller, "store created");
                Ok(handle)
            }
            Err(error) => {
                tracing::error!(store = name, %error, "store creation failed");
                if !matches!(error, VecsError::AlreadyExists { .. }) {
                    if let Err(cleanup) = self.lifecycle.delete_cert_store(name) {
                        tracing::error!(store = name, error = %cleanup, "failed to remove partially created store");
                    }
                }
                Err(error)
            }
        }
    }

    fn initialize_store(&self, store_id: StoreId, owner: &Principal) -> Result<StoreHandle> {
        let descriptor = SecurityDescriptor::with_revision(owner, INITIAL_DESCRIPTOR_REVISION)?;
        self.catalog.set_security_descriptor(store_id, &descriptor)?;
        self.registry.open_store(store_id, owner)
    }

    /// Resolve a store by name and open it for `caller`
    pub fn open_store(
        &self,
        name: &str,
        password: Option<&str>,
        caller: &Principal,
    ) -> Result<StoreHandle> {
        require_store_name(name)?;
        let store_id = self.catalog.get_cert_store_id(name, password)?;
        self.registry.open_store(store_id, caller)
    }

    /// Release a handle obtained from this service
    pub fn close_store(&self, handle: &StoreHandle, caller: &Principal) -> CloseOutcome {
        self.registry.close_handle(handle, caller)
    }

    /// Delete a store the caller owns and nobody else has open
    pub fn delete_store(&self, name: &str, caller: &Principal) -> Result<()> {
        require_store_name(name)?;
        let store_id = self.catalog.get_cert_store_id(name, None)?;
        let handle = self.registry.open_store(store_id, caller)?;

        let result = self.delete_opened(name, &handle, caller);
        if result.is_err() {
            self.registry.close_handle(&handle, caller);
        }
        result
    }

    fn delete_opened(&self, name: &str, handle: &StoreHandle, caller: &Principal) -> Result<()> {
        let _guard = self.state_lock.lock();
        self.registry.check_ownership(handle, caller)?;
        self.registry
            .delete_exclusive(handle, |_| self.lifecycle.delete_cert_store(name))?;
        tracing::info!(store = name, by = %caller, "store deleted");
        Ok(())
    }

    /// Authorize `caller` for `desired` on an open store
    pub fn access_check(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
        desired: AccessMask,
    ) -> Result<()> {
        if desired == 0 || desired & !self.config.allowed_access_mask != 0 {
            return Err(VecsError::invalid_argument(format!(
                "access mask {desired:#x} outside allowed {:#x}",
                self.config.allowed_access_mask
            )));
        }
        self.registry.access_check(handle, caller, desired)
    }

    /// Replace the mask of `user_name`'s entry
    pub fn set_permission(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
        user_name: &str,
        access_mask: AccessMask,
        kind: AceKind,
    ) -> Result<()> {
        self.modify_permission(handle, caller, user_name, access_mask, kind, ModifyMode::Set)
    }

    /// Add bits to `user_name`'s entry
    pub fn add_permission(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
        user_name: &str,
        access_mask: AccessMask,
        kind: AceKind,
    ) -> Result<()> {
        self.modify_permission(handle, caller, user_name, access_mask, kind, ModifyMode::Add)
    }

    /// Remove bits from `user_name`'s entry
    pub fn revoke_permission(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
        user_name: &str,
        access_mask: AccessMask,
        kind: AceKind,
    ) -> Result<()> {
        self.modify_permission(handle, caller, user_name, access_mask, kind, ModifyMode::Revoke)
    }

    fn modify_permission(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
        user_name: &str,
        access_mask: AccessMask,
        kind: AceKind,
        mode: ModifyMode,
    ) -> Result<()> {
        self.registry.check_ownership(handle, caller)?;
        let target = self.resolver.resolve_principal(user_name)?;

        let _guard = self.state_lock.lock();
        let mut descriptor = self.owned_descriptor(handle, caller)?;
        descriptor.modify_permissions(&target, access_mask, kind, mode)?;
        self.registry.set_descriptor(handle, &descriptor)?;

        tracing::info!(
            by = %caller,
            target = %target,
            ?mode,
            ?kind,
            rights = %describe_mask(access_mask),
            "store permissions changed"
        );
        Ok(())
    }

    /// Hand the store to the account named `new_owner_name`
    pub fn change_owner(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
        new_owner_name: &str,
    ) -> Result<()> {
        self.registry.check_ownership(handle, caller)?;
        let new_owner = self.resolver.resolve_principal(new_owner_name)?;

        let _guard = self.state_lock.lock();
        let mut descriptor = self.owned_descriptor(handle, caller)?;
        descriptor.modify_owner(&new_owner)?;
        self.registry.set_descriptor(handle, &descriptor)?;

        tracing::info!(from = %caller, to = %new_owner, "store owner changed");
        Ok(())
    }

    /// Snapshot to edit, taken with the state lock held
    ///
    /// Ownership is checked again on the snapshot itself; an owner change
    /// that committed after the caller's first check turns the edit into
    /// `AccessDenied`.
    fn owned_descriptor(&self, handle: &StoreHandle, caller: &Principal) -> Result<SecurityDescriptor> {
        let descriptor = self.registry.get_descriptor_snapshot(handle)?;
        if !descriptor.is_owner(caller) {
            return Err(VecsError::access_denied(format!(
                "{caller} no longer owns the store"
            )));
        }
        Ok(descriptor)
    }

    /// Copy of the descriptor for a caller holding a valid handle
    pub fn get_descriptor(
        &self,
        handle: &StoreHandle,
        caller: &Principal,
    ) -> Result<SecurityDescriptor> {
        if !self.registry.is_valid_handle(handle, caller) {
            return Err(VecsError::invalid_handle(format!(
                "{caller} does not hold {handle}"
            )));
        }
        self.registry.get_descriptor_snapshot(handle)
    }
}

impl std::fmt::Debug for StoreAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAuthService")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn require_store_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(VecsError::invalid_argument("store name must not be empty"));
    }
    Ok(())
}
