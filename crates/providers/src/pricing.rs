//! Catalog-backed model listing and cost lookup shared by every adapter.

use ch_domain::config::ModelEntry;
use ch_domain::model::{ModelInfo, ProviderName};

/// Embedding model used for content search.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// USD per 1000 tokens for [`EMBEDDING_MODEL`].
pub const EMBEDDING_COST_PER_1K: f64 = 0.00002;

pub fn embedding_cost(tokens: u32) -> f64 {
    tokens as f64 / 1000.0 * EMBEDDING_COST_PER_1K
}

/// One vendor's slice of the static catalog.
#[derive(Debug, Clone)]
pub struct PriceTable {
    provider: ProviderName,
    entries: Vec<ModelEntry>,
}

impl PriceTable {
    pub fn new(provider: ProviderName, entries: Vec<ModelEntry>) -> Self {
        Self { provider, entries }
    }

    /// Exact-name lookup.
    pub fn find(&self, model: &str) -> Option<&ModelEntry> {
        self.entries.iter().find(|e| e.name == model)
    }

    /// Estimated cost in USD; `0.0` for a model not in the catalog.
    pub fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.find(model)
            .map(|e| e.estimate_cost(input_tokens, output_tokens))
            .unwrap_or(0.0)
    }

    /// The catalog entries as [`ModelInfo`] records, all marked available.
    pub fn model_infos(&self) -> Vec<ModelInfo> {
        self.entries
            .iter()
            .map(|e| ModelInfo {
                id: e.name.clone(),
                name: e.name.clone(),
                display_name: e.display_name.clone(),
                provider: self.provider,
                cost_per_1k_input: e.cost_per_1k_input,
                cost_per_1k_output: e.cost_per_1k_output,
                available: true,
                description: e.description.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
