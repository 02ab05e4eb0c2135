//! API credential, read once from the environment at startup.

use std::fmt;

use crate::error::ConfigError;

/// Default environment variable holding the AEMET OpenData key.
pub const DEFAULT_API_KEY_ENV: &str = "AEMET_API_KEY";

/// Opaque API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingCredential("<inline>".to_string()));
        }
        Ok(ApiKey(trimmed.to_string()))
    }

    /// Read the key from `var`; an unset or blank variable is a configuration error.
    pub fn from_env(var: &str) -> Result<Self, ConfigError> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(ApiKey(value.trim().to_string())),
            _ => Err(ConfigError::MissingCredential(var.to_string())),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
