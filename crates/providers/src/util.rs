//! Shared utility functions for provider adapters.

use std::collections::HashMap;

use ch_domain::config::ModelsConfig;
use ch_domain::error::Error;
use ch_domain::model::ProviderName;

/// Convert a [`reqwest::Error`] into a [`Error::Provider`] failure
/// attributed to `provider`, timeouts included.
pub(crate) fn from_reqwest(provider: ProviderName, e: reqwest::Error) -> Error {
    let message = if e.is_timeout() {
        format!("timeout: {e}")
    } else {
        e.to_string()
    };
    Error::Provider {
        provider: provider.to_string(),
        message,
    }
}

/// Clamp a vendor-reported token counter into `u32`.
pub(crate) fn token_count(value: Option<u64>) -> u32 {
    value.map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX))
}

/// Build the error for a non-2xx vendor reply.
pub(crate) fn status_error(provider: ProviderName, status: reqwest::StatusCode, body: &str) -> Error {
    Error::Provider {
        provider: provider.to_string(),
        message: format!("HTTP {} - {}", status.as_u16(), body),
    }
}

/// The error an adapter returns when asked to call out without a key.
pub(crate) fn missing_key(provider: ProviderName) -> Error {
    Error::Configuration(format!(
        "{} not set",
        provider.default_key_env()
    ))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credentials
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// API keys per vendor, resolved once at startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<ProviderName, String>,
}

impl Credentials {
    /// Read each vendor's key from the env var named in `cfg`.
    ///
    /// Unset and empty variables both count as "no credential".
    pub fn from_env(cfg: &ModelsConfig) -> Self {
        let mut keys = HashMap::new();
        for provider in ProviderName::ALL {
            let var = cfg.key_env(provider);
            match std::env::var(var) {
                Ok(value) if !value.trim().is_empty() => {
                    keys.insert(provider, value);
                }
                _ => {
                    tracing::debug!(provider = %provider, env_var = %var, "no credential in environment");
                }
            }
        }
        Self { keys }
    }

    pub fn with(mut self, provider: ProviderName, key: impl Into<String>) -> Self {
        self.keys.insert(provider, key.into());
        self
    }

    pub fn get(&self, provider: ProviderName) -> Option<&str> {
        self.keys.get(&provider).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
