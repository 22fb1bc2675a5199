//! Unified error system for Warden
//!
//! Every failure that is *not* a credential validation outcome ends up here.
//! These errors are fatal from the caller's point of view: the host surfaces
//! them as server errors and decides its own retry policy.

use serde::{Deserialize, Serialize};

use crate::effects::StorageError;

/// Fatal failure of a Warden operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum WardenError {
    /// Bad configuration, or an entry or request that fails validation
    #[error("Invalid: {message}")]
    Invalid {
        /// What was rejected
        message: String,
    },

    /// An App, Group or SecretID record the operation depends on is gone
    #[error("Not found: {message}")]
    NotFound {
        /// What was looked up
        message: String,
    },

    /// Keyed hashing of a secret could not be performed
    #[error("Crypto error: {message}")]
    Crypto {
        /// Hasher diagnostic
        message: String,
    },

    /// A stored record, config file or context could not be encoded or
    /// decoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Decoder diagnostic, usually naming the storage key
        message: String,
    },

    /// The storage contract failed or timed out
    #[error("Storage error: {message}")]
    Storage {
        /// Rendered [`StorageError`]
        message: String,
    },

    /// A backend invariant was violated
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the broken invariant
        message: String,
    },
}

impl WardenError {
    /// Reject a config value, entry or request
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Report a missing App, Group or record
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a crypto error
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Report an undecodable record or document
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Wrap a storage failure message
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Report a broken invariant
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error came from the storage layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

/// Standard Result type for Warden operations
pub type Result<T> = std::result::Result<T, WardenError>;

impl From<StorageError> for WardenError {
    fn from(err: StorageError) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for WardenError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for WardenError {
    fn from(err: toml::de::Error) -> Self {
        Self::invalid(format!("Invalid TOML: {err}"))
    }
}

impl From<std::io::Error> for WardenError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = WardenError::invalid("lock_stripes must be non-zero");
        assert!(matches!(err, WardenError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: lock_stripes must be non-zero");
    }

    #[test]
    fn test_storage_error_conversion() {
        let err = WardenError::from(StorageError::Timeout { timeout_ms: 250 });
        assert!(err.is_storage());
        assert_eq!(
            err.to_string(),
            "Storage error: Storage operation timed out after 250ms"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "warden.toml");
        assert!(matches!(
            WardenError::from(io_err),
            WardenError::NotFound { .. }
        ));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u64>("not json").unwrap_err();
        assert!(matches!(
            WardenError::from(json_err),
            WardenError::Serialization { .. }
        ));
    }
}
