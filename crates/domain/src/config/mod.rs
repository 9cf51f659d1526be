mod catalog;
mod drafts;
mod models;
mod server;
mod store;

pub use catalog::*;
pub use drafts::*;
pub use models::*;
pub use server::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub drafts: DraftsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// `[observability]`: span export for `chitthi serve`. JSON logs are
/// always written; spans go to an OTLP/gRPC collector only when
/// `otlp_endpoint` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub otlp_endpoint: Option<String>,
    /// Reported as the `service.name` resource attribute.
    pub service_name: String,
    /// Fraction of traces kept, `0.0..=1.0`.
    pub sample_rate: f64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "chitthi".into(),
            sample_rate: 1.0,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        if self.server.max_concurrent_requests == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.max_concurrent_requests".into(),
                message: "must be greater than 0".into(),
            });
        }

        if !self.models.catalog_path.exists() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "models.catalog_path".into(),
                message: format!(
                    "{} not found; no providers will be registered",
                    self.models.catalog_path.display()
                ),
            });
        }

        if self.store.backend == StoreBackend::Postgrest {
            match self.store.url.as_deref() {
                None | Some("") => errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "store.url".into(),
                    message: "postgrest backend requires a url".into(),
                }),
                Some(_) => {}
            }
            if std::env::var(&self.store.api_key_env).is_err() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: "store.api_key_env".into(),
                    message: format!("{} is not set", self.store.api_key_env),
                });
            }
        }

        if !(0.0..=1.0).contains(&self.observability.sample_rate) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "observability.sample_rate".into(),
                message: "must be between 0.0 and 1.0".into(),
            });
        }

        errors
    }
}
