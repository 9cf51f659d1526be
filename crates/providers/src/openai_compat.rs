//! OpenAI chat-completions wire format.
//!
//! Shared by the OpenRouter and OpenAI-direct adapters, which speak the same
//! `/chat/completions` contract and differ only in base URL and headers.

use std::time::Duration;

use ch_domain::error::{Error, Result};
use ch_domain::model::{Embedding, ModelResponse, ProviderName};
use serde_json::Value;

use crate::traits::GenerateRequest;
use crate::util::{from_reqwest, missing_key, status_error, token_count};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An authenticated HTTP client for one chat-completions endpoint.
pub(crate) struct ChatCompletionsClient {
    provider: ProviderName,
    base_url: String,
    api_key: Option<String>,
    extra_headers: Vec<(&'static str, String)>,
    client: reqwest::Client,
}

impl ChatCompletionsClient {
    pub(crate) fn new(
        provider: ProviderName,
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        extra_headers: Vec<(&'static str, String)>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| from_reqwest(provider, e))?;

        Ok(Self {
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            extra_headers,
            client,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn decorate(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| missing_key(self.provider))?;
        let mut builder = builder.bearer_auth(key);
        for (name, value) in &self.extra_headers {
            builder = builder.header(*name, value);
        }
        Ok(builder)
    }

    /// POST `{base}/chat/completions` and normalize the reply.
    pub(crate) async fn complete(&self, req: &GenerateRequest) -> Result<ModelResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_chat_body(req);

        let resp = self
            .decorate(self.client.post(&url))?
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(self.provider, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(self.provider, status, &text));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| from_reqwest(self.provider, e))?;
        parse_chat_response(self.provider, &req.model, &json)
    }

    /// POST `{base}/embeddings` for a single input string.
    pub(crate) async fn embed(&self, text: &str, model: &str) -> Result<Embedding> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({ "model": model, "input": text });

        let resp = self
            .decorate(self.client.post(&url))?
            .json(&body)
            .send()
            .await
            .map_err(|e| from_reqwest(self.provider, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(self.provider, status, &text));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| from_reqwest(self.provider, e))?;
        parse_embedding_response(self.provider, model, &json)
    }

    /// GET `{base}/models` and return the advertised model ids.
    pub(crate) async fn list_model_ids(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .decorate(self.client.get(&url))?
            .send()
            .await
            .map_err(|e| from_reqwest(self.provider, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(self.provider, status, &text));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| from_reqwest(self.provider, e))?;
        let ids = json
            .get("data")
            .and_then(|d| d.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m.get("id").and_then(|v| v.as_str()))
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / response mapping
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub(crate) fn build_chat_body(req: &GenerateRequest) -> Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &req.system_prompt {
        messages.push(serde_json::json!({"role": "system", "content": system}));
    }
    messages.push(serde_json::json!({"role": "user", "content": req.prompt}));

    let mut body = serde_json::json!({
        "model": req.model,
        "messages": messages,
        "temperature": req.temperature,
    });
    if let Some(max) = req.max_tokens {
        body["max_tokens"] = serde_json::json!(max);
    }
    body
}

pub(crate) fn parse_chat_response(
    provider: ProviderName,
    requested_model: &str,
    json: &Value,
) -> Result<ModelResponse> {
    let choice = json
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| Error::Provider {
            provider: provider.to_string(),
            message: "response contained no choices".into(),
        })?;

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .unwrap_or_default()
        .to_string();

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|f| f.as_str())
        .map(String::from);

    let usage = json.get("usage");
    let token = |field: &str| token_count(usage.and_then(|u| u.get(field)).and_then(|v| v.as_u64()));

    let mut metadata = serde_json::Map::new();
    for key in ["id", "created"] {
        if let Some(v) = json.get(key) {
            metadata.insert(key.to_string(), v.clone());
        }
    }

    Ok(ModelResponse {
        content,
        model: requested_model.to_string(),
        provider,
        input_tokens: token("prompt_tokens"),
        output_tokens: token("completion_tokens"),
        finish_reason,
        metadata,
    })
}

pub(crate) fn parse_embedding_response(
    provider: ProviderName,
    model: &str,
    json: &Value,
) -> Result<Embedding> {
    let vector: Vec<f32> = json
        .get("data")
        .and_then(|d| d.get(0))
        .and_then(|d| d.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| Error::Provider {
            provider: provider.to_string(),
            message: "response contained no embedding".into(),
        })?
        .iter()
        .filter_map(|v| v.as_f64())
        .map(|v| v as f32)
        .collect();

    let usage = json.get("usage");
    let input_tokens = token_count(
        usage
            .and_then(|u| u.get("prompt_tokens").or_else(|| u.get("total_tokens")))
            .and_then(|v| v.as_u64()),
    );

    Ok(Embedding {
        vector,
        model: model.to_string(),
        provider,
        input_tokens,
    })
}
