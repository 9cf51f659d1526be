use ch_domain::error::{Error, Result};
use ch_domain::model::{Embedding, ModelInfo, ModelResponse, ProviderName};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A provider-agnostic single-turn generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Model identifier. For the registry this is the full cross-vendor id
    /// (`openai/gpt-4-turbo`); for an adapter it is whatever that vendor
    /// expects.
    pub model: String,
    /// The user prompt.
    pub prompt: String,
    /// Optional system instruction, sent as a system role or field.
    pub system_prompt: Option<String>,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f32,
    /// Maximum tokens in the response. `None` lets the vendor choose,
    /// except for Anthropic which requires a value.
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The same request addressed to a different model name.
    pub fn for_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Connectivity probe result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of a connectivity probe. Never an error: an unreachable vendor
/// is a value the caller inspects.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Accessible,
    Unreachable(String),
}

impl ConnectionStatus {
    pub fn is_accessible(&self) -> bool {
        matches!(self, ConnectionStatus::Accessible)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core provider trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Trait that every vendor adapter implements.
///
/// Adapters translate a [`GenerateRequest`] into one vendor's wire format
/// and normalize the reply into a [`ModelResponse`]. They never retry;
/// fallback is the registry's job.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    /// Which vendor this adapter talks to.
    fn name(&self) -> ProviderName;

    /// Run a single generation.
    async fn generate(&self, req: &GenerateRequest) -> Result<ModelResponse>;

    /// The models this adapter can serve, from the static catalog.
    async fn available_models(&self) -> Result<Vec<ModelInfo>>;

    /// Estimated USD cost. Unknown models cost `0.0`.
    fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64;

    /// Embed `text` with `model`. Only vendors with an embeddings endpoint
    /// override this.
    async fn embed(&self, _text: &str, model: &str) -> Result<Embedding> {
        Err(Error::InvalidRequest(format!(
            "{} does not serve embedding model {model}",
            self.name()
        )))
    }

    /// Model used by [`ModelProvider::test_connection`] when none is given.
    fn default_test_model(&self) -> &str;

    /// Issue a minimal generation (5-token cap) and report whether it worked.
    async fn test_connection(&self, model: Option<&str>) -> ConnectionStatus {
        let model = model.unwrap_or_else(|| self.default_test_model()).to_string();
        let req = GenerateRequest::new(model, "Test").with_max_tokens(Some(5));
        match self.generate(&req).await {
            Ok(_) => ConnectionStatus::Accessible,
            Err(e) => {
                tracing::debug!(provider = %self.name(), error = %e, "connection test failed");
                ConnectionStatus::Unreachable(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_uses_default_temperature() {
        let req = GenerateRequest::new("gpt-4", "hello");
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.system_prompt.is_none());
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn for_model_keeps_everything_else() {
        let req = GenerateRequest::new("openai/gpt-4-turbo", "hello")
            .with_system_prompt(Some("be brief".into()))
            .with_temperature(0.2)
            .with_max_tokens(Some(64));
        let local = req.for_model("gpt-4-turbo");
        assert_eq!(local.model, "gpt-4-turbo");
        assert_eq!(local.prompt, "hello");
        assert_eq!(local.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(local.max_tokens, Some(64));
    }

    #[test]
    fn connection_status_accessible() {
        assert!(ConnectionStatus::Accessible.is_accessible());
        assert!(!ConnectionStatus::Unreachable("boom".into()).is_accessible());
    }
}
