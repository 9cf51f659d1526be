//! Model registry.
//!
//! Holds the vendor adapters enabled for this process. At startup the
//! registry reads the [`ModelCatalog`] and the resolved [`Credentials`] and
//! instantiates an adapter for every vendor that is both enabled in the
//! catalog and has a key. The mapping is read-only afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use ch_domain::config::ModelCatalog;
use ch_domain::error::{Error, Result};
use ch_domain::model::{Embedding, ModelInfo, ModelResponse, ProviderName};
use ch_domain::trace::TraceEvent;

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;
use crate::openrouter::OpenRouterProvider;
use crate::pricing::EMBEDDING_MODEL;
use crate::routing;
use crate::traits::{ConnectionStatus, GenerateRequest, ModelProvider};
use crate::util::Credentials;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ModelRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Longest input sent to the embeddings endpoint, in characters.
pub const MAX_EMBEDDING_CHARS: usize = 8000;

pub struct ModelRegistry {
    providers: BTreeMap<ProviderName, Arc<dyn ModelProvider>>,
}

impl ModelRegistry {
    /// Build the registry from the catalog and environment credentials.
    ///
    /// A vendor with no credential is skipped silently. Adapters that fail
    /// to initialize are logged and skipped rather than aborting startup.
    pub fn from_catalog(catalog: &ModelCatalog, credentials: &Credentials) -> Self {
        let mut providers: BTreeMap<ProviderName, Arc<dyn ModelProvider>> = BTreeMap::new();

        for name in ProviderName::ALL {
            let section = catalog.section(name);
            if !section.enabled {
                tracing::debug!(provider = %name, "provider disabled in catalog");
                continue;
            }
            let Some(key) = credentials.get(name) else {
                tracing::info!(provider = %name, "no credential, provider not registered");
                continue;
            };
            let key = Some(key.to_string());

            let result: Result<Arc<dyn ModelProvider>> = match name {
                ProviderName::OpenRouter => OpenRouterProvider::from_catalog(section, key)
                    .map(|p| Arc::new(p) as Arc<dyn ModelProvider>),
                ProviderName::OpenAi => OpenAiProvider::from_catalog(section, key)
                    .map(|p| Arc::new(p) as Arc<dyn ModelProvider>),
                ProviderName::Anthropic => AnthropicProvider::from_catalog(section, key)
                    .map(|p| Arc::new(p) as Arc<dyn ModelProvider>),
            };

            match result {
                Ok(provider) => {
                    TraceEvent::ProviderRegistered {
                        provider: name.to_string(),
                        models: section.models.len(),
                    }
                    .emit();
                    providers.insert(name, provider);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %name,
                        error = %e,
                        "failed to initialize provider, skipping"
                    );
                }
            }
        }

        if providers.is_empty() {
            tracing::warn!("no model providers registered; generation will fail until keys are set");
        }

        Self { providers }
    }

    /// Build from already-constructed adapters (useful for testing).
    /// A later adapter with the same name replaces an earlier one.
    pub fn from_providers(list: Vec<Arc<dyn ModelProvider>>) -> Self {
        let providers = list.into_iter().map(|p| (p.name(), p)).collect();
        Self { providers }
    }

    pub fn get(&self, name: ProviderName) -> Option<Arc<dyn ModelProvider>> {
        self.providers.get(&name).cloned()
    }

    pub fn is_registered(&self, name: ProviderName) -> bool {
        self.providers.contains_key(&name)
    }

    /// Registered provider names, in stable order.
    pub fn list_providers(&self) -> Vec<ProviderName> {
        self.providers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    // ── Routing ────────────────────────────────────────────────────

    /// Which provider would serve `model_id`. May name an unregistered
    /// provider; see [`routing::resolve`].
    pub fn resolve(&self, model_id: &str) -> Option<ProviderName> {
        routing::resolve(model_id, |p| self.is_registered(p))
    }

    /// Generate with `req.model` as the cross-vendor model id.
    ///
    /// When the primary provider is OpenRouter and it fails, and
    /// `use_fallback` is set, one retry is made on the matching direct vendor
    /// with the vendor-local model name. If that retry fails too, the
    /// original OpenRouter error is returned.
    pub async fn generate(&self, req: GenerateRequest, use_fallback: bool) -> Result<ModelResponse> {
        let model_id = req.model.clone();
        let (name, provider) = self
            .resolve(&model_id)
            .and_then(|name| self.get(name).map(|p| (name, p)))
            .ok_or_else(|| Error::UnavailableProvider(model_id.clone()))?;

        let primary_err = match self.call(name, &provider, &req).await {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };

        if !use_fallback || name != ProviderName::OpenRouter {
            return Err(primary_err);
        }

        let Some(fallback_name) = routing::fallback_target(&model_id, |p| self.is_registered(p))
        else {
            return Err(primary_err);
        };
        let Some(fallback) = self.get(fallback_name) else {
            return Err(primary_err);
        };

        let local = routing::vendor_local_name(&model_id);
        tracing::warn!(
            provider = %name,
            fallback = %fallback_name,
            model = %model_id,
            error = %primary_err,
            "primary provider failed, trying direct vendor"
        );
        TraceEvent::LlmFallback {
            from_provider: name.to_string(),
            to_provider: fallback_name.to_string(),
            model: local.to_string(),
            reason: primary_err.to_string(),
        }
        .emit();

        match self.call(fallback_name, &fallback, &req.for_model(local)).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                tracing::warn!(
                    provider = %fallback_name,
                    model = %local,
                    error = %e,
                    "fallback provider failed, returning original error"
                );
                Err(primary_err)
            }
        }
    }

    /// Embed `text` with [`EMBEDDING_MODEL`] via OpenAI-direct, the only
    /// vendor with an embeddings endpoint. Newlines are flattened and the
    /// input is capped at [`MAX_EMBEDDING_CHARS`] characters.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        let cleaned = text.replace('\n', " ");
        let cleaned = cleaned.trim();
        if cleaned.is_empty() {
            return Err(Error::InvalidRequest("text to embed cannot be empty".into()));
        }
        let input: String = cleaned.chars().take(MAX_EMBEDDING_CHARS).collect();

        let provider = self
            .get(ProviderName::OpenAi)
            .ok_or_else(|| Error::UnavailableProvider(EMBEDDING_MODEL.into()))?;
        provider.embed(&input, EMBEDDING_MODEL).await
    }

    /// Cost estimate via the provider that would serve `model_id`; `0.0`
    /// when none is registered or the model is unknown to it.
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model_id: &str) -> f64 {
        self.resolve(model_id)
            .and_then(|name| self.providers.get(&name))
            .map(|p| p.estimate_cost(input_tokens, output_tokens, model_id))
            .unwrap_or(0.0)
    }

    /// Every registered provider's models. A provider whose listing fails
    /// is logged and left out.
    pub async fn get_all_models(&self) -> Vec<ModelInfo> {
        let listings = futures_util::future::join_all(
            self.providers
                .iter()
                .map(|(name, p)| async move { (*name, p.available_models().await) }),
        )
        .await;

        let mut all = Vec::new();
        for (name, result) in listings {
            match result {
                Ok(models) => all.extend(models),
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "failed to list models");
                }
            }
        }
        all
    }

    /// Probe a provider by name. Unknown or unregistered names are `false`.
    pub async fn test_provider(&self, name: &str) -> bool {
        self.probe(name).await.is_accessible()
    }

    /// Like [`ModelRegistry::test_provider`] but keeps the failure reason.
    pub async fn probe(&self, name: &str) -> ConnectionStatus {
        let Ok(name) = name.parse::<ProviderName>() else {
            return ConnectionStatus::Unreachable(format!("unknown provider '{name}'"));
        };
        match self.get(name) {
            Some(p) => p.test_connection(None).await,
            None => ConnectionStatus::Unreachable(format!("provider '{name}' not registered")),
        }
    }

    // ── Internal helpers ───────────────────────────────────────────

    async fn call(
        &self,
        name: ProviderName,
        provider: &Arc<dyn ModelProvider>,
        req: &GenerateRequest,
    ) -> Result<ModelResponse> {
        let start = Instant::now();
        let result = provider.generate(req).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, input_tokens, output_tokens) = match &result {
            Ok(resp) => (true, Some(resp.input_tokens), Some(resp.output_tokens)),
            Err(_) => (false, None, None),
        };
        TraceEvent::LlmRequest {
            provider: name.to_string(),
            model: req.model.clone(),
            duration_ms,
            success,
            input_tokens,
            output_tokens,
        }
        .emit();
        result
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("providers", &self.list_providers())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
models:
  openrouter:
    enabled: true
    models:
      - name: openai/gpt-4-turbo
        display_name: GPT-4 Turbo
        cost_per_1k_input: 0.01
        cost_per_1k_output: 0.03
  direct:
    openai:
      enabled: true
      models:
        - name: gpt-4
          display_name: GPT-4
          cost_per_1k_input: 0.03
          cost_per_1k_output: 0.06
    anthropic:
      enabled: false
"#;

    #[test]
    fn registers_only_enabled_with_credentials() {
        let catalog = ModelCatalog::from_yaml_str(CATALOG).unwrap();
        let creds = Credentials::default()
            .with(ProviderName::OpenAi, "sk-test")
            .with(ProviderName::Anthropic, "sk-ant");
        let registry = ModelRegistry::from_catalog(&catalog, &creds);
        // openrouter has no key, anthropic is disabled.
        assert_eq!(registry.list_providers(), vec![ProviderName::OpenAi]);
    }

    #[test]
    fn no_credentials_means_empty_registry() {
        let catalog = ModelCatalog::from_yaml_str(CATALOG).unwrap();
        let registry = ModelRegistry::from_catalog(&catalog, &Credentials::default());
        assert!(registry.is_empty());
        assert_eq!(registry.resolve("some/model"), None);
    }

    #[test]
    fn estimate_cost_routes_through_resolved_provider() {
        let catalog = ModelCatalog::from_yaml_str(CATALOG).unwrap();
        let creds = Credentials::default()
            .with(ProviderName::OpenRouter, "sk-or")
            .with(ProviderName::OpenAi, "sk-test");
        let registry = ModelRegistry::from_catalog(&catalog, &creds);
        let direct = registry.estimate_cost(1000, 2000, "gpt-4");
        assert!((direct - 0.15).abs() < 1e-10);
        let routed = registry.estimate_cost(1000, 1000, "openai/gpt-4-turbo");
        assert!((routed - 0.04).abs() < 1e-10);
        assert_eq!(registry.estimate_cost(1000, 1000, "unknown-model"), 0.0);
    }

    #[tokio::test]
    async fn unknown_provider_probe_is_false() {
        let registry = ModelRegistry::from_providers(Vec::new());
        assert!(!registry.test_provider("mistral").await);
        assert!(!registry.test_provider("openai").await);
    }
}
