//! Static model catalog.
//!
//! Loaded once at process start from `models.yaml`:
//!
//! ```yaml
//! models:
//!   openrouter:
//!     enabled: true
//!     models:
//!       - name: openai/gpt-4-turbo
//!         display_name: GPT-4 Turbo
//!         cost_per_1k_input: 0.01
//!         cost_per_1k_output: 0.03
//!   direct:
//!     openai: { enabled: true, models: [...] }
//!     anthropic: { enabled: true, models: [...] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::ProviderName;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: CatalogSections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSections {
    #[serde(default)]
    pub openrouter: ProviderCatalog,
    #[serde(default)]
    pub direct: DirectCatalog,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectCatalog {
    #[serde(default)]
    pub openai: ProviderCatalog,
    #[serde(default)]
    pub anthropic: ProviderCatalog,
}

/// One vendor's block in the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCatalog {
    #[serde(default)]
    pub enabled: bool,
    /// Override for the vendor API root (tests, proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout; vendors default to 60 seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub models: Vec<ModelEntry>,
}

/// A priced model entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub cost_per_1k_input: f64,
    #[serde(default)]
    pub cost_per_1k_output: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ModelEntry {
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1000.0) * self.cost_per_1k_input
            + (output_tokens as f64 / 1000.0) * self.cost_per_1k_output
    }
}

impl ModelCatalog {
    /// Read and parse a YAML catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The block configuring a given vendor.
    pub fn section(&self, provider: ProviderName) -> &ProviderCatalog {
        match provider {
            ProviderName::OpenRouter => &self.models.openrouter,
            ProviderName::OpenAi => &self.models.direct.openai,
            ProviderName::Anthropic => &self.models.direct.anthropic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
models:
  openrouter:
    enabled: true
    models:
      - name: openai/gpt-4-turbo
        display_name: GPT-4 Turbo
        cost_per_1k_input: 0.01
        cost_per_1k_output: 0.03
        description: Latest GPT-4
      - name: meta-llama/llama-3-70b-instruct
        display_name: Llama 3 70B
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
      timeout_secs: 30
"#;

    #[test]
    fn parses_nested_sections() {
        let catalog = ModelCatalog::from_yaml_str(SAMPLE).unwrap();
        let or = catalog.section(ProviderName::OpenRouter);
        assert!(or.enabled);
        assert_eq!(or.models.len(), 2);
        assert_eq!(or.models[0].description.as_deref(), Some("Latest GPT-4"));
        // Missing prices default to zero.
        assert_eq!(or.models[1].cost_per_1k_input, 0.0);

        let anthropic = catalog.section(ProviderName::Anthropic);
        assert!(!anthropic.enabled);
        assert_eq!(anthropic.timeout_secs, Some(30));
        assert!(anthropic.models.is_empty());
    }

    #[test]
    fn empty_document_disables_everything() {
        let catalog = ModelCatalog::from_yaml_str("{}").unwrap();
        for name in ProviderName::ALL {
            assert!(!catalog.section(name).enabled);
        }
    }

    #[test]
    fn entry_cost_uses_per_thousand_pricing() {
        let entry = ModelEntry {
            name: "gpt-4".into(),
            display_name: "GPT-4".into(),
            cost_per_1k_input: 0.03,
            cost_per_1k_output: 0.06,
            description: None,
        };
        let cost = entry.estimate_cost(1000, 2000);
        assert!((cost - 0.15).abs() < 1e-10);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.yaml");
        std::fs::write(&path, SAMPLE).unwrap();
        let catalog = ModelCatalog::load(&path).unwrap();
        assert_eq!(catalog.section(ProviderName::OpenAi).models[0].name, "gpt-4");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ModelCatalog::load(Path::new("/nonexistent/models.yaml")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
