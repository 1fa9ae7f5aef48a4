//! Configuration traits

use crate::errors::Result;

/// Validation hook run after loading and merging a configuration
pub trait ConfigValidation {
    /// Reject values the subsystem cannot run with
    fn validate(&self) -> Result<()>;
}
