//! OpenRouter adapter.
//!
//! OpenRouter fronts many vendors behind one OpenAI-compatible API, with
//! vendor-qualified model ids (`openai/gpt-4-turbo`, `meta-llama/...`).

use std::collections::HashSet;
use std::time::Duration;

use ch_domain::config::ProviderCatalog;
use ch_domain::error::Result;
use ch_domain::model::{ModelInfo, ModelResponse, ProviderName};

use crate::openai_compat::ChatCompletionsClient;
use crate::pricing::PriceTable;
use crate::traits::{GenerateRequest, ModelProvider};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const REFERER: &str = "https://github.com/chitthi/chitthi";
const TITLE: &str = "Newsletter Engine";

pub struct OpenRouterProvider {
    http: ChatCompletionsClient,
    prices: PriceTable,
}

impl OpenRouterProvider {
    /// Build from the catalog's `openrouter` block. A `None` key still
    /// constructs; calls then fail with a configuration error.
    pub fn from_catalog(section: &ProviderCatalog, api_key: Option<String>) -> Result<Self> {
        let base_url = section.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let timeout = Duration::from_secs(section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let http = ChatCompletionsClient::new(
            ProviderName::OpenRouter,
            base_url,
            api_key,
            timeout,
            vec![
                ("HTTP-Referer", REFERER.to_string()),
                ("X-Title", TITLE.to_string()),
            ],
        )?;
        Ok(Self {
            http,
            prices: PriceTable::new(ProviderName::OpenRouter, section.models.clone()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenRouterProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OpenRouter
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<ModelResponse> {
        self.http.complete(req).await
    }

    /// Static catalog, with `available` refreshed from the live `/models`
    /// listing when that call succeeds.
    async fn available_models(&self) -> Result<Vec<ModelInfo>> {
        let mut models = self.prices.model_infos();
        match self.http.list_model_ids().await {
            Ok(ids) => {
                let live: HashSet<String> = ids.into_iter().collect();
                for m in &mut models {
                    m.available = live.contains(&m.id);
                }
            }
            Err(e) => {
                tracing::warn!(
                    provider = "openrouter",
                    error = %e,
                    "live model listing failed, using static catalog"
                );
            }
        }
        Ok(models)
    }

    fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.prices.estimate_cost(input_tokens, output_tokens, model)
    }

    fn default_test_model(&self) -> &str {
        "openai/gpt-3.5-turbo"
    }
}
