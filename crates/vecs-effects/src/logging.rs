//! Log subscriber setup

use tracing_subscriber::EnvFilter;
use vecs_core::{LoggingConfig, Result, VecsError};

/// Install a global fmt subscriber
///
/// The filter comes from `RUST_LOG` when it is set to a valid directive and
/// from `config.filter` otherwise. Installing twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = select_filter(config, rust_log.as_deref())?;

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}

fn select_filter(config: &LoggingConfig, rust_log: Option<&str>) -> Result<EnvFilter> {
    let from_env = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok());
    if let Some(filter) = from_env {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| {
        VecsError::invalid_argument(format!("logging.filter {:?}: {e}", config.filter))
    })
}
