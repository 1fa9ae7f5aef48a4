//! Configuration values and loading

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::traits::ConfigValidation;
use crate::errors::{Result, VecsError};
use crate::types::access::{AccessMask, READ_STORE, WRITE_STORE};

/// Default number of slots in the session table
pub const DEFAULT_TABLE_SIZE: usize = 64;

/// Default multiplier of the slot hash `(store_id * multiplier) % table_size`
pub const DEFAULT_HASH_MULTIPLIER: u64 = 67;

/// Width of the per-principal instance bitmask
pub const MAX_INSTANCE_BITS: u32 = u32::BITS;

const ENV_PREFIX: &str = "VECS_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VecsConfig {
    /// Session registry sizing
    pub registry: RegistryConfig,
    /// Store service policy
    pub service: ServiceConfig,
    /// Log output
    pub logging: LoggingConfig,
}

/// Session registry sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Number of slots in the session table
    pub table_size: usize,
    /// Multiplier applied to the store id before reducing modulo the table size
    pub hash_multiplier: u64,
    /// Concurrent handles one principal may hold on one store
    pub max_instances_per_principal: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            table_size: DEFAULT_TABLE_SIZE,
            hash_multiplier: DEFAULT_HASH_MULTIPLIER,
            max_instances_per_principal: MAX_INSTANCE_BITS,
        }
    }
}

impl ConfigValidation for RegistryConfig {
    fn validate(&self) -> Result<()> {
        if self.table_size == 0 {
            return Err(VecsError::invalid_argument(
                "registry.table_size must be at least 1",
            ));
        }
        if u32::try_from(self.table_size).is_err() {
            return Err(VecsError::invalid_argument(
                "registry.table_size must fit in 32 bits",
            ));
        }
        if self.hash_multiplier == 0 {
            return Err(VecsError::invalid_argument(
                "registry.hash_multiplier must be at least 1",
            ));
        }
        if self.max_instances_per_principal == 0
            || self.max_instances_per_principal > MAX_INSTANCE_BITS
        {
            return Err(VecsError::invalid_argument(format!(
                "registry.max_instances_per_principal must be in 1..={MAX_INSTANCE_BITS}"
            )));
        }
        Ok(())
    }
}

/// Store service policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bits a caller may request in an access check
    pub allowed_access_mask: AccessMask,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            allowed_access_mask: READ_STORE | WRITE_STORE,
        }
    }
}

impl ConfigValidation for ServiceConfig {
    fn validate(&self) -> Result<()> {
        if self.allowed_access_mask == 0 {
            return Err(VecsError::invalid_argument(
                "service.allowed_access_mask must grant at least one bit",
            ));
        }
        Ok(())
    }
}

/// Log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing-subscriber` env-filter directive
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl ConfigValidation for LoggingConfig {
    fn validate(&self) -> Result<()> {
        if self.filter.trim().is_empty() {
            return Err(VecsError::invalid_argument("logging.filter must not be empty"));
        }
        Ok(())
    }
}

impl VecsConfig {
    /// Parse a TOML document; missing fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VecsError::invalid_argument(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Overlay `VECS_*` environment variables
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Overlay `VECS_*` variables from an explicit key/value list
    pub fn merge_with_vars<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "TABLE_SIZE" => self.registry.table_size = parse_var(name, value)?,
                "HASH_MULTIPLIER" => self.registry.hash_multiplier = parse_var(name, value)?,
                "MAX_INSTANCES" => {
                    self.registry.max_instances_per_principal = parse_var(name, value)?;
                }
                "LOG_FILTER" => self.logging.filter = value.to_string(),
                _ => {}
            }
        }
        Ok(())
    }
}

impl ConfigValidation for VecsConfig {
    fn validate(&self) -> Result<()> {
        self.registry.validate()?;
        self.service.validate()?;
        self.logging.validate()
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        VecsError::invalid_argument(format!("{ENV_PREFIX}{name}: cannot parse {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_table() {
        let config = VecsConfig::default();
        assert_eq!(config.registry.table_size, 64);
        assert_eq!(config.registry.hash_multiplier, 67);
        assert_eq!(config.registry.max_instances_per_principal, 32);
        assert_eq!(config.service.allowed_access_mask, READ_STORE | WRITE_STORE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = VecsConfig::from_toml_str(
            r#"
            [registry]
            table_size = 8

            [logging]
            filter = "vecs_store=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.registry.table_size, 8);
        assert_eq!(config.registry.hash_multiplier, DEFAULT_HASH_MULTIPLIER);
        assert_eq!(config.logging.filter, "vecs_store=debug");
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[registry]\nmax_instances_per_principal = 4").unwrap();
        let config = VecsConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.registry.max_instances_per_principal, 4);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = VecsConfig::load_from_file(Path::new("/nonexistent/vecs.toml")).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = VecsConfig::default();
        config
            .merge_with_vars([
                ("VECS_TABLE_SIZE", "16"),
                ("VECS_MAX_INSTANCES", "2"),
                ("VECS_LOG_FILTER", "debug"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.registry.table_size, 16);
        assert_eq!(config.registry.max_instances_per_principal, 2);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let mut config = VecsConfig::default();
        let err = config
            .merge_with_vars([("VECS_TABLE_SIZE", "many")])
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn validation_bounds() {
        let mut config = VecsConfig::default();
        config.registry.max_instances_per_principal = 33;
        assert!(config.validate().is_err());

        config.registry.max_instances_per_principal = 32;
        config.registry.table_size = 0;
        assert!(config.validate().is_err());

        config.registry.table_size = 64;
        config.service.allowed_access_mask = 0;
        assert!(config.validate().is_err());
    }
}
