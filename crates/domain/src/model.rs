use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider names
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The vendors a registry can hold an adapter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    OpenRouter,
    OpenAi,
    Anthropic,
}

impl ProviderName {
    pub const ALL: [ProviderName; 3] = [
        ProviderName::OpenRouter,
        ProviderName::OpenAi,
        ProviderName::Anthropic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::OpenRouter => "openrouter",
            ProviderName::OpenAi => "openai",
            ProviderName::Anthropic => "anthropic",
        }
    }

    /// Default environment variable holding this vendor's API key.
    pub fn default_key_env(&self) -> &'static str {
        match self {
            ProviderName::OpenRouter => "OPENROUTER_API_KEY",
            ProviderName::OpenAi => "OPENAI_API_KEY",
            ProviderName::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openrouter" => Ok(ProviderName::OpenRouter),
            "openai" => Ok(ProviderName::OpenAi),
            "anthropic" => Ok(ProviderName::Anthropic),
            other => Err(crate::error::Error::InvalidRequest(format!(
                "unknown provider '{other}'"
            ))),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A model one of the providers can serve, with its pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Vendor-qualified identifier, e.g. `openai/gpt-4-turbo`.
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub provider: ProviderName,
    pub cost_per_1k_input: f64,
    pub cost_per_1k_output: f64,
    #[serde(default = "d_true")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A completed generation, normalized across vendors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    /// The model name the request was issued with.
    pub model: String,
    pub provider: ProviderName,
    pub input_tokens: u32,
    pub output_tokens: u32,
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Vendor bookkeeping (response id, creation timestamp).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ModelResponse {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// A text embedding and the tokens it was billed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: String,
    pub provider: ProviderName,
    pub input_tokens: u32,
}

fn d_true() -> bool {
    true
}
