//! Adapter wire-format tests against a local mock vendor.
//!
//! Each test starts a wiremock server and points the adapter's `base_url`
//! at it, so no real vendor is contacted.

use std::sync::Arc;
use std::time::Duration;

use ch_domain::config::{ModelCatalog, ModelEntry, ProviderCatalog};
use ch_domain::error::Error;
use ch_domain::model::ProviderName;
use ch_providers::anthropic::AnthropicProvider;
use ch_providers::openai::OpenAiProvider;
use ch_providers::openrouter::OpenRouterProvider;
use ch_providers::{ConnectionStatus, Credentials, GenerateRequest, ModelProvider, ModelRegistry};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn section(uri: &str, models: Vec<ModelEntry>) -> ProviderCatalog {
    ProviderCatalog {
        enabled: true,
        base_url: Some(uri.to_string()),
        timeout_secs: Some(5),
        models,
    }
}

fn entry(name: &str, input: f64, output: f64) -> ModelEntry {
    ModelEntry {
        name: name.into(),
        display_name: name.to_uppercase(),
        cost_per_1k_input: input,
        cost_per_1k_output: output,
        description: None,
    }
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-abc123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "gpt-4-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 10, "total_tokens": 30}
    })
}

fn anthropic_message(text: &str) -> serde_json::Value {
    json!({
        "id": "msg_01XFDUDYJgAACzvnptvVoYEL",
        "type": "message",
        "role": "assistant",
        "content": [{"type": "text", "text": text}],
        "model": "claude-3-5-sonnet-20241022",
        "stop_reason": "end_turn",
        "stop_sequence": null,
        "usage": {"input_tokens": 10, "output_tokens": 15}
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OpenRouter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn openrouter_sends_bearer_and_attribution_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-or-test"))
        .and(header("X-Title", "Newsletter Engine"))
        .and(body_partial_json(json!({"model": "openai/gpt-4-turbo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("Namaste duniya")))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenRouterProvider::from_catalog(&section(&server.uri(), vec![]), Some("sk-or-test".into()))
            .unwrap();
    let resp = provider
        .generate(&GenerateRequest::new("openai/gpt-4-turbo", "hello"))
        .await
        .unwrap();

    assert_eq!(resp.content, "Namaste duniya");
    assert_eq!(resp.model, "openai/gpt-4-turbo");
    assert_eq!(resp.provider, ProviderName::OpenRouter);
    assert_eq!(resp.input_tokens, 20);
    assert_eq!(resp.output_tokens, 10);
    assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    assert_eq!(resp.metadata["id"], "chatcmpl-abc123");
}

#[tokio::test]
async fn openrouter_non_2xx_is_provider_error_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let provider =
        OpenRouterProvider::from_catalog(&section(&server.uri(), vec![]), Some("k".into())).unwrap();
    let err = provider
        .generate(&GenerateRequest::new("openai/gpt-4-turbo", "hello"))
        .await
        .unwrap_err();

    match err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, "openrouter");
            assert_eq!(message, "HTTP 502 - upstream down");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

#[tokio::test]
async fn openrouter_live_listing_refreshes_availability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "openai/gpt-4-turbo"}, {"id": "some/other-model"}]
        })))
        .mount(&server)
        .await;

    let models = vec![
        entry("openai/gpt-4-turbo", 0.01, 0.03),
        entry("meta-llama/llama-2-70b", 0.0, 0.0),
    ];
    let provider =
        OpenRouterProvider::from_catalog(&section(&server.uri(), models), Some("k".into())).unwrap();
    let listed = provider.available_models().await.unwrap();

    assert_eq!(listed.len(), 2);
    assert!(listed[0].available);
    assert!(!listed[1].available);
}

#[tokio::test]
async fn openrouter_listing_failure_keeps_static_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider = OpenRouterProvider::from_catalog(
        &section(&server.uri(), vec![entry("openai/gpt-4-turbo", 0.01, 0.03)]),
        Some("k".into()),
    )
    .unwrap();
    let listed = provider.available_models().await.unwrap();

    assert_eq!(listed.len(), 1);
    assert!(listed[0].available);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// OpenAI direct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn openai_without_key_is_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::from_catalog(&section(&server.uri(), vec![]), None).unwrap();
    let err = provider
        .generate(&GenerateRequest::new("gpt-4", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
}

#[tokio::test]
async fn openai_connection_probe_uses_five_token_cap() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo", "max_tokens": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        OpenAiProvider::from_catalog(&section(&server.uri(), vec![]), Some("sk".into())).unwrap();
    assert_eq!(provider.test_connection(None).await, ConnectionStatus::Accessible);
}

#[tokio::test]
async fn failed_probe_is_a_value_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let provider =
        OpenAiProvider::from_catalog(&section(&server.uri(), vec![]), Some("sk".into())).unwrap();
    let status = provider.test_connection(Some("gpt-4")).await;
    assert!(!status.is_accessible());
}

#[tokio::test]
async fn openai_timeout_is_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut slow = section(&server.uri(), vec![]);
    slow.timeout_secs = Some(1);
    let provider = OpenAiProvider::from_catalog(&slow, Some("sk".into())).unwrap();
    let err = provider
        .generate(&GenerateRequest::new("gpt-4", "hello"))
        .await
        .unwrap_err();
    match err {
        Error::Provider { provider, message } => {
            assert_eq!(provider, "openai");
            assert!(message.starts_with("timeout:"), "{message}");
        }
        other => panic!("expected provider error, got {other:?}"),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Anthropic direct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn anthropic_messages_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-api-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "max_tokens": 4096,
            "system": "Write in Hinglish"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_message("Hello!")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = AnthropicProvider::from_catalog(
        &section(&server.uri(), vec![]),
        Some("test-api-key".into()),
    )
    .unwrap();
    let req = GenerateRequest::new("claude-3-5-sonnet-20241022", "hi")
        .with_system_prompt(Some("Write in Hinglish".into()));
    let resp = provider.generate(&req).await.unwrap();

    assert_eq!(resp.content, "Hello!");
    assert_eq!(resp.provider, ProviderName::Anthropic);
    assert_eq!(resp.input_tokens, 10);
    assert_eq!(resp.output_tokens, 15);
    assert_eq!(resp.finish_reason.as_deref(), Some("end_turn"));
    assert_eq!(resp.metadata["id"], "msg_01XFDUDYJgAACzvnptvVoYEL");
}

#[tokio::test]
async fn anthropic_error_body_is_carried_in_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let provider =
        AnthropicProvider::from_catalog(&section(&server.uri(), vec![]), Some("bad".into()))
            .unwrap();
    let err = provider
        .generate(&GenerateRequest::new("claude-3-opus", "hi"))
        .await
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("HTTP 401"));
    assert!(text.contains("invalid x-api-key"));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry over real adapters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn registry_falls_back_from_openrouter_to_openai_over_http() {
    let openrouter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .expect(1)
        .mount(&openrouter)
        .await;

    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4-turbo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("from openai")))
        .expect(1)
        .mount(&openai)
        .await;

    let mut catalog = ModelCatalog::default();
    catalog.models.openrouter = section(&openrouter.uri(), vec![]);
    catalog.models.direct.openai = section(&openai.uri(), vec![]);
    let creds = Credentials::default()
        .with(ProviderName::OpenRouter, "sk-or")
        .with(ProviderName::OpenAi, "sk-oa");
    let registry = Arc::new(ModelRegistry::from_catalog(&catalog, &creds));

    let resp = registry
        .generate(GenerateRequest::new("openai/gpt-4-turbo", "hello"), true)
        .await
        .unwrap();
    assert_eq!(resp.content, "from openai");
    assert_eq!(resp.provider, ProviderName::OpenAi);
    assert_eq!(resp.model, "gpt-4-turbo");
}

#[tokio::test]
async fn registry_falls_back_when_openrouter_times_out() {
    let openrouter = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&openrouter)
        .await;

    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-4-turbo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("from openai")))
        .expect(1)
        .mount(&openai)
        .await;

    let mut catalog = ModelCatalog::default();
    catalog.models.openrouter = section(&openrouter.uri(), vec![]);
    catalog.models.openrouter.timeout_secs = Some(1);
    catalog.models.direct.openai = section(&openai.uri(), vec![]);
    let creds = Credentials::default()
        .with(ProviderName::OpenRouter, "sk-or")
        .with(ProviderName::OpenAi, "sk-oa");
    let registry = ModelRegistry::from_catalog(&catalog, &creds);

    let resp = registry
        .generate(GenerateRequest::new("openai/gpt-4-turbo", "hello"), true)
        .await
        .unwrap();
    assert_eq!(resp.provider, ProviderName::OpenAi);
    assert_eq!(resp.content, "from openai");

    let err = registry
        .generate(GenerateRequest::new("openai/gpt-4-turbo", "hello"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Provider { ref provider, .. } if provider == "openrouter"));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Embeddings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn registry_embeds_through_openai_with_flattened_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(header("authorization", "Bearer sk-oa"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": "IPL final  recap"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut catalog = ModelCatalog::default();
    catalog.models.direct.openai = section(&server.uri(), vec![]);
    let creds = Credentials::default().with(ProviderName::OpenAi, "sk-oa");
    let registry = ModelRegistry::from_catalog(&catalog, &creds);

    let emb = registry.embed("  IPL final\n recap \n").await.unwrap();
    assert_eq!(emb.vector.len(), 3);
    assert_eq!(emb.provider, ProviderName::OpenAi);
    assert_eq!(emb.input_tokens, 4);
}

#[tokio::test]
async fn embeddings_need_openai_and_non_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut catalog = ModelCatalog::default();
    catalog.models.openrouter = section(&server.uri(), vec![]);
    catalog.models.direct.openai = section(&server.uri(), vec![]);

    let only_openrouter = ModelRegistry::from_catalog(
        &catalog,
        &Credentials::default().with(ProviderName::OpenRouter, "sk-or"),
    );
    let err = only_openrouter.embed("chai").await.unwrap_err();
    assert!(matches!(err, Error::UnavailableProvider(_)));

    let with_openai = ModelRegistry::from_catalog(
        &catalog,
        &Credentials::default().with(ProviderName::OpenAi, "sk-oa"),
    );
    let err = with_openai.embed(" \n ").await.unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}
