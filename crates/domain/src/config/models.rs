use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::ProviderName;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model routing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Path of the YAML model catalog.
    #[serde(default = "d_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default = "d_openrouter_env")]
    pub openrouter_key_env: String,
    #[serde(default = "d_openai_env")]
    pub openai_key_env: String,
    #[serde(default = "d_anthropic_env")]
    pub anthropic_key_env: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            catalog_path: d_catalog_path(),
            openrouter_key_env: d_openrouter_env(),
            openai_key_env: d_openai_env(),
            anthropic_key_env: d_anthropic_env(),
        }
    }
}

impl ModelsConfig {
    /// The environment variable that holds a vendor's API key.
    pub fn key_env(&self, provider: ProviderName) -> &str {
        match provider {
            ProviderName::OpenRouter => &self.openrouter_key_env,
            ProviderName::OpenAi => &self.openai_key_env,
            ProviderName::Anthropic => &self.anthropic_key_env,
        }
    }
}

fn d_catalog_path() -> PathBuf {
    PathBuf::from("config/models.yaml")
}
fn d_openrouter_env() -> String {
    ProviderName::OpenRouter.default_key_env().into()
}
fn d_openai_env() -> String {
    ProviderName::OpenAi.default_key_env().into()
}
fn d_anthropic_env() -> String {
    ProviderName::Anthropic.default_key_env().into()
}
