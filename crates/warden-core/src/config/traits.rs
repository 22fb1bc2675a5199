//! Core configuration traits for the Warden configuration system

use crate::WardenError;
use std::path::Path;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "WARDEN_";

/// Core trait for Warden configuration types
pub trait WardenConfig: Clone + Default + Send + Sync + 'static {
    /// Keys accepted by [`WardenConfig::set_from_string`]
    const KEYS: &'static [&'static str];

    /// Load configuration from a TOML or JSON file
    fn load_from_file(path: &Path) -> Result<Self, WardenError>;

    /// Merge with `WARDEN_*` environment variables
    fn merge_with_env(&mut self) -> Result<(), WardenError> {
        let vars: Vec<(String, String)> = std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        self.merge_with_vars(vars)
    }

    /// Merge with an explicit set of `(NAME, value)` pairs.
    ///
    /// Names are matched after stripping [`ENV_PREFIX`] and lowercasing;
    /// unrelated names are ignored.
    fn merge_with_vars<I>(&mut self, vars: I) -> Result<(), WardenError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key = key.to_lowercase();
            if Self::KEYS.contains(&key.as_str()) {
                self.set_from_string(&key, &value)?;
            }
        }
        Ok(())
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), WardenError>;

    /// Set a configuration value from a string
    fn set_from_string(&mut self, key: &str, value: &str) -> Result<(), WardenError>;
}
