//! Anthropic-direct adapter.
//!
//! Implements the Anthropic Messages API, where the system instruction is a
//! separate top-level `system` field and `max_tokens` is mandatory.

use std::time::Duration;

use ch_domain::config::ProviderCatalog;
use ch_domain::error::{Error, Result};
use ch_domain::model::{ModelInfo, ModelResponse, ProviderName};
use serde_json::Value;

use crate::pricing::PriceTable;
use crate::traits::{GenerateRequest, ModelProvider};
use crate::util::{from_reqwest, missing_key, status_error, token_count};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Constants
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct AnthropicProvider {
    base_url: String,
    api_key: Option<String>,
    prices: PriceTable,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn from_catalog(section: &ProviderCatalog, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(
                section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ))
            .build()
            .map_err(|e| from_reqwest(ProviderName::Anthropic, e))?;

        Ok(Self {
            base_url: section
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key,
            prices: PriceTable::new(ProviderName::Anthropic, section.models.clone()),
            client,
        })
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn authed_post(&self, url: &str) -> Result<reqwest::RequestBuilder> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| missing_key(ProviderName::Anthropic))?;
        Ok(self
            .client
            .post(url)
            .header("x-api-key", key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json"))
    }
}

fn build_messages_body(req: &GenerateRequest) -> Value {
    let mut body = serde_json::json!({
        "model": req.model,
        "messages": [{"role": "user", "content": req.prompt}],
        "temperature": req.temperature,
        "max_tokens": req.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    });
    if let Some(system) = &req.system_prompt {
        body["system"] = Value::String(system.clone());
    }
    body
}

fn parse_messages_response(requested_model: &str, json: &Value) -> Result<ModelResponse> {
    let blocks = json
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| Error::Provider {
            provider: ProviderName::Anthropic.to_string(),
            message: "response contained no content blocks".into(),
        })?;

    let content: String = blocks
        .iter()
        .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect();

    let usage = json.get("usage");
    let token = |field: &str| token_count(usage.and_then(|u| u.get(field)).and_then(|v| v.as_u64()));

    let mut metadata = serde_json::Map::new();
    if let Some(id) = json.get("id") {
        metadata.insert("id".into(), id.clone());
    }

    Ok(ModelResponse {
        content,
        model: requested_model.to_string(),
        provider: ProviderName::Anthropic,
        input_tokens: token("input_tokens"),
        output_tokens: token("output_tokens"),
        finish_reason: json
            .get("stop_reason")
            .and_then(|s| s.as_str())
            .map(String::from),
        metadata,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ModelProvider implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Anthropic
    }

    async fn generate(&self, req: &GenerateRequest) -> Result<ModelResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = build_messages_body(req);

        let resp = self
            .authed_post(&url)?
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(ProviderName::Anthropic, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(ProviderName::Anthropic, status, &text));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| from_reqwest(ProviderName::Anthropic, e))?;
        parse_messages_response(&req.model, &json)
    }

    async fn available_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(self.prices.model_infos())
    }

    fn estimate_cost(&self, input_tokens: u32, output_tokens: u32, model: &str) -> f64 {
        self.prices.estimate_cost(input_tokens, output_tokens, model)
    }

    fn default_test_model(&self) -> &str {
        "claude-3-5-sonnet-20241022"
    }
}
