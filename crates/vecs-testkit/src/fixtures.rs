//! Principals, registries and services wired with test collaborators

use std::sync::Arc;

use vecs_core::{LoggingConfig, NonceEffects, Principal, RegistryConfig, StoreId, VecsConfig};
use vecs_store::{StoreAuthService, StoreRegistry};

use crate::catalog::MemoryCatalog;
use crate::directory::StaticDirectory;
use crate::nonce::MockNonceHandler;

/// User 1001
pub fn alice() -> Principal {
    Principal::user(1001, "alice")
}

/// User 1002
pub fn bob() -> Principal {
    Principal::user(1002, "bob")
}

/// User 1003, a member of [`cert_admins`]
pub fn carol() -> Principal {
    Principal::user(1003, "carol")
}

/// Group 2000
pub fn cert_admins() -> Principal {
    Principal::group(2000, "certadmins")
}

/// alice, bob and carol; carol is in `certadmins`
pub fn standard_directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_principal(&alice())
        .with_principal(&bob())
        .with_member(&cert_admins(), &carol())
}

/// Route `tracing` output to the test harness at debug level
pub fn init_test_tracing() {
    let config = LoggingConfig {
        filter: "debug".to_string(),
    };
    let _ = vecs_effects::logging::init_tracing(&config);
}

/// Registry over a memory catalog and the standard directory
pub struct RegistryFixture {
    /// Backing catalog, shared with the registry
    pub catalog: Arc<MemoryCatalog>,
    /// Membership source, shared with the registry
    pub directory: Arc<StaticDirectory>,
    /// Registry under test
    pub registry: StoreRegistry,
}

impl RegistryFixture {
    /// Default sizing with seeded nonces
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Custom sizing with seeded nonces
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::with_nonces(config, Arc::new(MockNonceHandler::new()))
    }

    /// Custom sizing and nonce source
    pub fn with_nonces(config: RegistryConfig, nonces: Arc<dyn NonceEffects>) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let directory = Arc::new(standard_directory());
        let registry = StoreRegistry::new(config, catalog.clone(), nonces, directory.clone()).unwrap();
        Self {
            catalog,
            directory,
            registry,
        }
    }

    /// Create a named store owned by `owner`
    pub fn add_store(&self, name: &str, owner: &Principal) -> StoreId {
        self.catalog.add_store(name, owner)
    }

    /// Persist an owner-only descriptor under a chosen id
    pub fn add_store_with_id(&self, id: u64, owner: &Principal) -> StoreId {
        let id = StoreId::new(id).unwrap();
        self.catalog.put_descriptor(
            id,
            vecs_authorization::SecurityDescriptor::with_revision(owner, 1).unwrap(),
        );
        id
    }
}

impl Default for RegistryFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Store service over a memory catalog and the standard directory
pub struct ServiceFixture {
    /// Backing catalog, shared with the service
    pub catalog: Arc<MemoryCatalog>,
    /// Service under test
    pub service: StoreAuthService,
}

impl ServiceFixture {
    /// Default configuration
    pub fn new() -> Self {
        Self::with_config(VecsConfig::default())
    }

    /// Custom configuration
    pub fn with_config(config: VecsConfig) -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        let directory = Arc::new(standard_directory());
        let service = StoreAuthService::new(
            &config,
            catalog.clone(),
            Arc::new(MockNonceHandler::new()),
            directory.clone(),
            directory,
        )
        .unwrap();
        Self { catalog, service }
    }
}

impl Default for ServiceFixture {
    fn default() -> Self {
        Self::new()
    }
}
