//! Login handler
//!
//! The request body is decoded once into a typed [`LoginRequest`]; every
//! decoding problem is a validation failure. A successful validation becomes
//! an [`Auth`] grant the host turns into a token.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::backend::AppGroupBackend;
use crate::error::AuthError;
use crate::selector::Selector;
use crate::types::{Lease, TokenContext};
use warden_core::effects::{PhysicalTimeEffects, StorageEffects};
use warden_core::WardenError;

/// One-line summary of the login path
pub const LOGIN_HELP_SYNOPSIS: &str =
    "Issue a token for a SecretID of an App, Group or SuperGroup.";

/// Long description of the login path
pub const LOGIN_HELP_DESCRIPTION: &str = "\
The SecretID is presented either together with a separate selector_id \
(\"app/<name>\", \"group/<name>\" or \"supergroup\") or alone as \
\"<selector_id>;<secret_id>\". A use-limited SecretID loses one use per \
successful login and is deleted after its last use. The issued token \
carries the union of the policies of the selector's Apps, Groups and \
additional policies, with a renewable lease of the configured token_ttl.";

/// Typed login request
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    /// Resolved selector
    pub selector: Selector,
    /// Plaintext secret identifier
    pub secret_id: String,
}

impl LoginRequest {
    /// Build a request from the raw `selector_id` and `secret_id` fields.
    ///
    /// A non-empty `selector_id` is used as is. Otherwise `secret_id` must
    /// carry the selector as `<selector>;<secret>`, split on the first `;`.
    pub fn from_fields(
        selector_id: Option<&str>,
        secret_id: Option<&str>,
    ) -> Result<Self, AuthError> {
        let selector_id = selector_id.map(str::trim).unwrap_or_default();
        let secret_id = secret_id.map(str::trim).unwrap_or_default();

        let (selector, secret) = if selector_id.is_empty() {
            let Some((left, right)) = secret_id.split_once(';') else {
                return Err(AuthError::MissingSelectorId);
            };
            if left.is_empty() {
                return Err(AuthError::MissingSelectorId);
            }
            if right.is_empty() {
                return Err(AuthError::MissingSecretId);
            }
            (left, right)
        } else {
            if secret_id.is_empty() {
                return Err(AuthError::MissingSecretId);
            }
            (selector_id, secret_id)
        };

        Ok(Self {
            selector: Selector::parse(selector)?,
            secret_id: secret.to_string(),
        })
    }

    /// Decode a JSON request body. `null` fields count as absent.
    pub fn from_json(body: &Value) -> Result<Self, AuthError> {
        let Value::Object(fields) = body else {
            return Err(AuthError::InvalidField {
                field: "request",
                reason: "expected a JSON object".to_string(),
            });
        };
        let string_field = |field: &'static str| match fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(AuthError::InvalidField {
                field,
                reason: "expected a string".to_string(),
            }),
        };
        let selector_id = string_field("selector_id")?;
        let secret_id = string_field("secret_id")?;
        Self::from_fields(selector_id, secret_id)
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("selector", &self.selector)
            .field("secret_id", &"<redacted>")
            .finish()
    }
}

/// Authentication grant handed to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auth {
    /// Context the host stores and hands back on renewal
    pub context: TokenContext,
    /// Granted policies, sorted
    pub policies: Vec<String>,
    /// Renewable lease
    pub lease: Lease,
}

/// Outcome of a login
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginResponse {
    /// Credentials were valid
    Authenticated(Auth),
    /// Credentials were rejected; `message` is safe to show the client
    Denied {
        /// Short diagnostic
        message: String,
    },
}

impl LoginResponse {
    /// The grant, if the login succeeded
    pub fn auth(&self) -> Option<&Auth> {
        match self {
            Self::Authenticated(auth) => Some(auth),
            Self::Denied { .. } => None,
        }
    }

    /// Denial message, if the login failed
    pub fn denial(&self) -> Option<&str> {
        match self {
            Self::Authenticated(_) => None,
            Self::Denied { message } => Some(message),
        }
    }

    fn denied(err: AuthError) -> Result<Self, WardenError> {
        let message = err.into_denial()?;
        tracing::warn!(reason = %message, "login denied");
        Ok(Self::Denied { message })
    }
}

impl<S, T> AppGroupBackend<S, T>
where
    S: StorageEffects,
    T: PhysicalTimeEffects,
{
    /// Log in with a decoded request.
    ///
    /// Validation failures come back as [`LoginResponse::Denied`]; `Err` is
    /// reserved for system failures. The first lease is clamped by the same
    /// ceiling renewals honor.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, WardenError> {
        let result = match self
            .validate_credentials(&request.selector, &request.secret_id)
            .await
        {
            Ok(result) => result,
            Err(err) => return LoginResponse::denied(err),
        };

        let issued_at = self.now().await?;
        let ttl = result
            .ttl_ceiling()
            .extend(issued_at, issued_at, self.config.system_max_ttl)?;
        tracing::info!(
            selector_id = %result.selector_id,
            policies = %result.policies,
            ttl,
            "login succeeded"
        );
        Ok(LoginResponse::Authenticated(Auth {
            context: TokenContext::new(result.selector_id),
            policies: result.policies.to_vec(),
            lease: Lease {
                ttl,
                renewable: true,
                issued_at,
            },
        }))
    }

    /// Decode a JSON request body and log in
    pub async fn login_json(&self, body: &Value) -> Result<LoginResponse, WardenError> {
        match LoginRequest::from_json(body) {
            Ok(request) => self.login(&request).await,
            Err(err) => LoginResponse::denied(err),
        }
    }
}
