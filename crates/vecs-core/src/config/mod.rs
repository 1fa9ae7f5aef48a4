//! Configuration for the store session subsystem
//!
//! Hosts load a [`VecsConfig`] from TOML, overlay environment variables,
//! and validate it before constructing the registry.

mod settings;
mod traits;

pub use settings::{
    LoggingConfig, RegistryConfig, ServiceConfig, VecsConfig, DEFAULT_HASH_MULTIPLIER,
    DEFAULT_TABLE_SIZE, MAX_INSTANCE_BITS,
};
pub use traits::ConfigValidation;
