use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use super::traits::WardenConfig;
use crate::WardenError;

/// Default ceiling for grants whose entry sets no `token_max_ttl`: 32 days.
pub const DEFAULT_SYSTEM_MAX_TTL: u64 = 32 * 24 * 60 * 60;

/// Default per-call storage timeout.
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;

/// Default number of SecretID lock stripes.
pub const DEFAULT_LOCK_STRIPES: usize = 256;

/// Startup configuration of the AppGroup credential backend
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// HMAC key used to hash secret identifiers before they hit storage
    pub secret_id_salt: String,
    /// Lease ceiling in seconds used when an entry's `token_max_ttl` is 0
    pub system_max_ttl: u64,
    /// Per-call storage timeout in milliseconds; 0 disables the timeout
    pub storage_timeout_ms: u64,
    /// Number of lock stripes guarding SecretID read-decrement-write
    pub lock_stripes: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            secret_id_salt: String::new(),
            system_max_ttl: DEFAULT_SYSTEM_MAX_TTL,
            storage_timeout_ms: DEFAULT_STORAGE_TIMEOUT_MS,
            lock_stripes: DEFAULT_LOCK_STRIPES,
        }
    }
}

impl BackendConfig {
    /// Default configuration with the given salt
    pub fn with_salt(salt: impl Into<String>) -> Self {
        Self {
            secret_id_salt: salt.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("secret_id_salt", &"<redacted>")
            .field("system_max_ttl", &self.system_max_ttl)
            .field("storage_timeout_ms", &self.storage_timeout_ms)
            .field("lock_stripes", &self.lock_stripes)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, WardenError> {
    value
        .trim()
        .parse()
        .map_err(|_| WardenError::invalid(format!("Invalid number for {key}: {value}")))
}

impl WardenConfig for BackendConfig {
    const KEYS: &'static [&'static str] = &[
        "secret_id_salt",
        "system_max_ttl",
        "storage_timeout_ms",
        "lock_stripes",
    ];

    fn load_from_file(path: &Path) -> Result<Self, WardenError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WardenError::internal(format!("Failed to read config file: {e}")))?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| WardenError::invalid(format!("Invalid JSON: {e}")))?,
            _ => return Err(WardenError::invalid("Unsupported file format")),
        };
        tracing::debug!(path = %path.display(), "loaded backend configuration");
        Ok(config)
    }

    fn validate(&self) -> Result<(), WardenError> {
        if self.secret_id_salt.is_empty() {
            return Err(WardenError::invalid("secret_id_salt cannot be empty"));
        }
        if self.system_max_ttl == 0 {
            return Err(WardenError::invalid("system_max_ttl cannot be 0"));
        }
        if self.lock_stripes == 0 {
            return Err(WardenError::invalid("lock_stripes cannot be 0"));
        }
        Ok(())
    }

    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), WardenError> {
        match key {
            "secret_id_salt" => self.secret_id_salt = value.to_string(),
            "system_max_ttl" => self.system_max_ttl = parse_number(key, value)?,
            "storage_timeout_ms" => self.storage_timeout_ms = parse_number(key, value)?,
            "lock_stripes" => self.lock_stripes = parse_number(key, value)?,
            _ => {
                return Err(WardenError::invalid(format!(
                    "Unknown configuration key: {key}"
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_requires_salt() {
        let config = BackendConfig::default();
        assert!(config.validate().is_err());
        assert!(BackendConfig::with_salt("s").validate().is_ok());
    }

    #[test]
    fn test_load_toml_with_partial_fields() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "secret_id_salt = \"pepper\"\nlock_stripes = 16").unwrap();

        let config = BackendConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.secret_id_salt, "pepper");
        assert_eq!(config.lock_stripes, 16);
        assert_eq!(config.system_max_ttl, DEFAULT_SYSTEM_MAX_TTL);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(BackendConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_merge_with_vars_ignores_unrelated_names() {
        let mut config = BackendConfig::with_salt("a");
        config
            .merge_with_vars(vec![
                ("WARDEN_SYSTEM_MAX_TTL".to_string(), "600".to_string()),
                ("WARDEN_LOG_FORMAT".to_string(), "json".to_string()),
                ("HOME".to_string(), "/root".to_string()),
            ])
            .unwrap();
        assert_eq!(config.system_max_ttl, 600);
        assert_eq!(config.secret_id_salt, "a");
    }

    #[test]
    fn test_merge_with_vars_rejects_bad_number() {
        let mut config = BackendConfig::with_salt("a");
        let result =
            config.merge_with_vars(vec![("WARDEN_LOCK_STRIPES".to_string(), "lots".to_string())]);
        assert!(matches!(result, Err(WardenError::Invalid { .. })));
    }

    #[test]
    fn test_debug_redacts_salt() {
        let config = BackendConfig::with_salt("hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
