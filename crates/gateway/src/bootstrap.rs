//! AppState construction extracted from `main.rs`.
//!
//! `serve` builds the full [`AppState`]; one-shot CLI commands (`models`,
//! `test`, `generate`) only need the registry and use [`build_registry`].

use std::sync::Arc;

use anyhow::Context;

use ch_domain::config::{Config, ConfigSeverity, ModelCatalog, ModelsConfig};
use ch_providers::{Credentials, ModelRegistry};

use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Model registry ───────────────────────────────────────────────
    let registry = Arc::new(build_registry(&config.models));
    tracing::info!(
        providers = ?registry.list_providers(),
        "model registry ready"
    );

    // ── Stores ───────────────────────────────────────────────────────
    let stores = ch_store::create_store(&config.store).context("initializing store")?;

    Ok(AppState {
        config,
        registry,
        usage: stores.usage,
        drafts: stores.drafts,
        content: stores.content,
    })
}

/// Load the catalog and environment credentials and build the registry.
///
/// A missing or unreadable catalog yields an empty registry; the server
/// still boots and generation fails with "provider not available".
pub fn build_registry(models: &ModelsConfig) -> ModelRegistry {
    let catalog = load_catalog(models);
    let credentials = Credentials::from_env(models);
    ModelRegistry::from_catalog(&catalog, &credentials)
}

pub fn load_catalog(models: &ModelsConfig) -> ModelCatalog {
    match ModelCatalog::load(&models.catalog_path) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::warn!(
                path = %models.catalog_path.display(),
                error = %e,
                "failed to load model catalog, no providers enabled"
            );
            ModelCatalog::default()
        }
    }
}
