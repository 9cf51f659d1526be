//! OpenAI-direct adapter.

use std::time::Duration;

use ch_domain::config::ProviderCatalog;
use ch_domain::error::Result;
use ch_domain::model::{Embedding, ModelInfo, ModelResponse, ProviderName};

use crate::openai_compat::ChatCompletionsClient;
use crate::pricing::PriceTable;
use crate::traits::{GenerateRequest, ModelProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct OpenAiProvider {
    http: ChatCompletionsClient,
    prices: PriceTable,
}

impl OpenAiProvider {
    pub fn from_catalog(section: &ProviderCatalog, api_key: Option<String>) -> Result<Self> {
        let base_url = section.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        let timeout = Duration::from_secs(section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let http = ChatCompletionsClient::new(
            ProviderName::OpenAi,
            base_url,
            api_key,
            timeout,
            Vec::new(),
        )?;
        Ok(Self {
            http,
            prices: PriceTable::new(ProviderName::OpenAi, section.models.clone()),
        })
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OpenAi
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<ModelResponse> {
        self.http.complete(req).await
    }

    async fn embed(&self, text: &str, model: &str) -> Result<Embedding> {
        self.http.embed(text, model).await
    }

    async fn available_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self.prices.model_infos())
    }

    fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.prices.estimate_cost(input_tokens, output_tokens, model)
    }

    fn default_test_model(&self) -> &str {
        "gpt-3.5-turbo"
    }
}
