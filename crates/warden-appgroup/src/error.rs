//! Authentication error classes
//!
//! Every variant except [`AuthError::System`] is a validation failure: the
//! caller presented bad input or a credential that is unknown, expired or
//! exhausted. Those become ordinary "authentication denied" responses.
//! [`AuthError::System`] wraps a fatal [`WardenError`] that the host must
//! surface as a server error.

use warden_core::WardenError;

/// Result type for credential validation
pub type Result<T> = std::result::Result<T, AuthError>;

/// Login and validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No secret identifier was supplied, or the delimited form had nothing
    /// after the `;`
    #[error("missing secret_id")]
    MissingSecretId,

    /// No selector could be found in either field
    #[error("missing selector_id")]
    MissingSelectorId,

    /// A request field could not be decoded into its expected type
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending request field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// The selector does not match `app/<name>`, `group/<name>` or `supergroup`
    #[error("invalid selector_id: {value:?}")]
    MalformedSelector {
        /// The selector as supplied
        value: String,
    },

    /// The secret identifier is unknown, expired or exhausted
    #[error("failed to validate secret ID: {reason}")]
    InvalidSecretId {
        /// Short diagnostic
        reason: String,
    },

    /// Fatal system failure (storage, hashing, internal invariant)
    #[error(transparent)]
    System(#[from] WardenError),
}

impl AuthError {
    /// Create a secret ID validation failure
    pub fn invalid_secret_id(reason: impl Into<String>) -> Self {
        Self::InvalidSecretId {
            reason: reason.into(),
        }
    }

    /// Whether this is a user-facing validation failure rather than a
    /// system failure
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::System(_))
    }

    /// Split into the response message for validation failures, or the
    /// fatal error for system failures
    pub fn into_denial(self) -> std::result::Result<String, WardenError> {
        match self {
            Self::System(err) => Err(err),
            other => Ok(other.to_string()),
        }
    }
}

impl From<warden_core::effects::StorageError> for AuthError {
    fn from(err: warden_core::effects::StorageError) -> Self {
        Self::System(err.into())
    }
}

impl From<warden_core::effects::TimeError> for AuthError {
    fn from(err: warden_core::effects::TimeError) -> Self {
        Self::System(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(AuthError::MissingSecretId.to_string(), "missing secret_id");
        assert_eq!(
            AuthError::MissingSelectorId.to_string(),
            "missing selector_id"
        );
        assert_eq!(
            AuthError::invalid_secret_id("secret ID expired").to_string(),
            "failed to validate secret ID: secret ID expired"
        );
        assert_eq!(
            AuthError::MalformedSelector {
                value: "user/bob".into()
            }
            .to_string(),
            "invalid selector_id: \"user/bob\""
        );
    }

    #[test]
    fn test_classification() {
        assert!(AuthError::MissingSecretId.is_validation());
        let system = AuthError::from(WardenError::storage("disk on fire"));
        assert!(!system.is_validation());
        assert_eq!(
            system.into_denial(),
            Err(WardenError::storage("disk on fire"))
        );
        assert_eq!(
            AuthError::MissingSelectorId.into_denial(),
            Ok("missing selector_id".to_string())
        );
    }
}
