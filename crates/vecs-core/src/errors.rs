//! Unified error system for the certificate store subsystem
//!
//! A single error enum shared by the ACL engine, the session registry and
//! the store service. Every public operation returns [`Result`]; nothing
//! in the subsystem panics on a caller error.

use serde::{Deserialize, Serialize};

/// Unified error type for all store session operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum VecsError {
    /// Malformed or missing identity, mask, or store reference
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the rejected argument
        message: String,
    },

    /// Handle is stale, closed, or held by another principal
    #[error("Invalid handle: {message}")]
    InvalidHandle {
        /// Why the handle was rejected
        message: String,
    },

    /// Ownership or ACL check failed
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Which check denied access
        message: String,
    },

    /// Session table or per-principal instance bits exhausted
    #[error("No capacity: {message}")]
    NoCapacity {
        /// Which capacity ran out
        message: String,
    },

    /// Allocation failed while copying or inserting
    #[error("Out of memory: {message}")]
    OutOfMemory {
        /// The allocation that failed
        message: String,
    },

    /// Store is still referenced elsewhere
    #[error("Busy: {message}")]
    Busy {
        /// What is still holding the resource
        message: String,
    },

    /// Store or principal not found
    #[error("Not found: {message}")]
    NotFound {
        /// What was not found
        message: String,
    },

    /// Store already exists
    #[error("Already exists: {message}")]
    AlreadyExists {
        /// What already exists
        message: String,
    },

    /// Failure forwarded from the persistent catalog
    #[error("Storage error: {message}")]
    Storage {
        /// Error reported by the backing store
        message: String,
    },

    /// Internal invariant violation
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the fault
        message: String,
    },
}

impl VecsError {
    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invalid handle error
    pub fn invalid_handle(message: impl Into<String>) -> Self {
        Self::InvalidHandle {
            message: message.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Create a capacity exhausted error
    pub fn no_capacity(message: impl Into<String>) -> Self {
        Self::NoCapacity {
            message: message.into(),
        }
    }

    /// Create an allocation failure error
    pub fn out_of_memory(message: impl Into<String>) -> Self {
        Self::OutOfMemory {
            message: message.into(),
        }
    }

    /// Create a busy error
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an already exists error
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable code for mapping onto wire-level status values
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::InvalidHandle { .. } => "invalid_handle",
            Self::AccessDenied { .. } => "access_denied",
            Self::NoCapacity { .. } => "no_capacity",
            Self::OutOfMemory { .. } => "out_of_memory",
            Self::Busy { .. } => "busy",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Storage { .. } => "storage",
            Self::Internal { .. } => "internal",
        }
    }

    /// True for ownership/ACL denials
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    /// True for stale or foreign handles
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Self::InvalidHandle { .. })
    }

    /// True when the table or instance bits ran out
    pub fn is_no_capacity(&self) -> bool {
        matches!(self, Self::NoCapacity { .. })
    }

    /// True for rejected arguments
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}

/// Standard Result type for store session operations
pub type Result<T> = std::result::Result<T, VecsError>;

impl From<std::io::Error> for VecsError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::access_denied(err.to_string()),
            std::io::ErrorKind::OutOfMemory => Self::out_of_memory(err.to_string()),
            _ => Self::storage(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for VecsError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid_argument(format!("Invalid configuration: {err}"))
    }
}

impl From<std::collections::TryReserveError> for VecsError {
    fn from(err: std::collections::TryReserveError) -> Self {
        Self::out_of_memory(err.to_string())
    }
}
