//! Model catalog, connectivity and ad-hoc generation endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use ch_domain::model::ModelResponse;
use ch_providers::traits::DEFAULT_TEMPERATURE;
use ch_providers::{ConnectionStatus, GenerateRequest};
use ch_store::usage::operation;
use ch_store::{track, TrackOutcome, UsageRecord};

use super::error::{api_error, ApiError};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    let models = state.registry.get_all_models().await;
    let count = models.len();
    Json(serde_json::json!({
        "models": models,
        "count": count,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/models/costs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Price of 1000 input + 1000 output tokens for every listed model.
pub async fn model_costs(State(state): State<AppState>) -> impl IntoResponse {
    let models = state.registry.get_all_models().await;
    let costs: Vec<_> = models
        .iter()
        .map(|m| {
            serde_json::json!({
                "model_id": m.id,
                "display_name": m.display_name,
                "provider": m.provider,
                "cost_per_2k_tokens": state.registry.estimate_cost(1000, 1000, &m.id),
                "cost_per_1k_input": m.cost_per_1k_input,
                "cost_per_1k_output": m.cost_per_1k_output,
            })
        })
        .collect();
    Json(serde_json::json!({ "costs": costs }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/models/providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let providers = state.registry.list_providers();
    Json(serde_json::json!({
        "providers": providers,
        "count": providers.len(),
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/models/test
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default, Deserialize)]
pub struct TestModelRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// `provider` wins when both are given. A model is tested through the
/// provider it resolves to, using that provider's default test model.
pub async fn test_model(
    State(state): State<AppState>,
    Json(req): Json<TestModelRequest>,
) -> Response {
    if let Some(provider) = req.provider {
        let status = state.registry.probe(&provider).await;
        log_probe(&provider, &status);
        let accessible = status.is_accessible();
        return Json(serde_json::json!({
            "provider": provider,
            "status": status_label(accessible),
            "accessible": accessible,
        }))
        .into_response();
    }

    let Some(model) = req.model else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "Either model or provider must be specified",
        );
    };

    let Some(provider) = state.registry.resolve(&model) else {
        return api_error(StatusCode::NOT_FOUND, "Provider not found for model");
    };

    let status = state.registry.probe(provider.as_str()).await;
    log_probe(provider.as_str(), &status);
    let accessible = status.is_accessible();
    Json(serde_json::json!({
        "model": model,
        "provider": provider,
        "status": status_label(accessible),
        "accessible": accessible,
    }))
    .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/models/generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: String,
    pub model: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn d_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

pub async fn generate_text(
    State(state): State<AppState>,
    Json(req): Json<GenerateTextRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request = GenerateRequest::new(req.model, req.prompt)
        .with_system_prompt(req.system_prompt)
        .with_temperature(req.temperature)
        .with_max_tokens(req.max_tokens);

    let response = state.registry.generate(request, true).await?;
    let estimated_cost = record_usage(&state, &response, operation::GENERATE).await;

    Ok(Json(serde_json::json!({
        "content": response.content,
        "model": response.model,
        "provider": response.provider,
        "tokens": tokens_json(&response),
        "estimated_cost": estimated_cost,
        "metadata": response.metadata,
    })))
}

// ── Internal helpers ────────────────────────────────────────────────

pub(crate) fn tokens_json(response: &ModelResponse) -> serde_json::Value {
    serde_json::json!({
        "input": response.input_tokens,
        "output": response.output_tokens,
        "total": response.total_tokens(),
    })
}

/// Estimate the call's cost and append it to the usage sink. Returns the
/// estimate; a sink failure is logged and otherwise ignored.
pub(crate) async fn record_usage(
    state: &AppState,
    response: &ModelResponse,
    operation_type: &str,
) -> f64 {
    let cost = state.registry.estimate_cost(
        response.input_tokens,
        response.output_tokens,
        &response.model,
    );
    let record = UsageRecord::new(
        response.provider.as_str(),
        &response.model,
        operation_type,
        response.input_tokens,
        response.output_tokens,
        cost,
    );
    if let TrackOutcome::Dropped(reason) = track(state.usage.as_ref(), record).await {
        tracing::debug!(operation = operation_type, reason = %reason, "usage record dropped");
    }
    cost
}

fn status_label(accessible: bool) -> &'static str {
    if accessible {
        "success"
    } else {
        "failed"
    }
}

fn log_probe(provider: &str, status: &ConnectionStatus) {
    if let ConnectionStatus::Unreachable(reason) = status {
        tracing::warn!(provider = %provider, reason = %reason, "provider probe failed");
    }
}
