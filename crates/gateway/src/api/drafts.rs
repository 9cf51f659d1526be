//! Newsletter draft generation, comparison and versioned storage.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use ch_domain::error::Error;
use ch_domain::trace::TraceEvent;
use ch_providers::traits::DEFAULT_TEMPERATURE;
use ch_providers::GenerateRequest;
use ch_store::drafts::DEFAULT_LIST_LIMIT;
use ch_store::usage::operation;
use ch_store::NewDraft;

use super::error::{api_error, ApiError};
use super::models::{record_usage, tokens_json};
use crate::state::AppState;

const MIN_COMPARE_MODELS: usize = 2;
const MAX_COMPARE_MODELS: usize = 5;

fn d_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/drafts/generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct GenerateDraftRequest {
    #[serde(default)]
    pub topic_id: Option<String>,
    pub model: String,
    /// Becomes the user prompt; the configured default prompt otherwise.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Persist the generated draft as version 1.
    #[serde(default)]
    pub save: bool,
}

pub async fn generate_draft(
    State(state): State<AppState>,
    Json(req): Json<GenerateDraftRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let defaults = &state.config.drafts;
    let prompt = req
        .context
        .unwrap_or_else(|| defaults.default_prompt.clone());
    let system_prompt = req
        .system_prompt
        .unwrap_or_else(|| defaults.default_system_prompt.clone());
    let max_tokens = req.max_tokens.unwrap_or(defaults.default_max_tokens);

    let request = GenerateRequest::new(&req.model, prompt.clone())
        .with_system_prompt(Some(system_prompt))
        .with_temperature(req.temperature)
        .with_max_tokens(Some(max_tokens));

    let response = state.registry.generate(request, true).await?;
    let estimated_cost = record_usage(&state, &response, operation::DRAFT_GENERATION).await;

    let mut draft = serde_json::json!({
        "content": response.content,
        "title": "",
        "model": response.model,
        "provider": response.provider,
    });

    if req.save {
        let saved = state
            .drafts
            .create_draft(NewDraft {
                content: response.content.clone(),
                topic_id: req.topic_id,
                title: None,
                model_used: Some(response.model.clone()),
                prompt_used: Some(prompt),
                status: None,
            })
            .await?;
        TraceEvent::DraftSaved {
            draft_id: saved.id.to_string(),
            version: saved.version,
        }
        .emit();
        draft["id"] = serde_json::json!(saved.id);
    }

    Ok(Json(serde_json::json!({
        "draft": draft,
        "metadata": {
            "tokens": tokens_json(&response),
            "estimated_cost": estimated_cost,
            "finish_reason": response.finish_reason,
        },
    })))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/drafts/compare
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct CompareModelsRequest {
    pub models: Vec<String>,
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "d_temperature")]
    pub temperature: f32,
}

/// Run the same prompt through several models at once. A failing model
/// shows up as a `"failed"` entry; the others still return.
pub async fn compare_models(
    State(state): State<AppState>,
    Json(req): Json<CompareModelsRequest>,
) -> Response {
    if req.models.len() < MIN_COMPARE_MODELS {
        return api_error(
            StatusCode::BAD_REQUEST,
            format!("At least {MIN_COMPARE_MODELS} models required for comparison"),
        );
    }
    if req.models.len() > MAX_COMPARE_MODELS {
        return api_error(
            StatusCode::BAD_REQUEST,
            format!("Maximum {MAX_COMPARE_MODELS} models for comparison"),
        );
    }

    let runs = req.models.iter().map(|model_id| {
        let state = &state;
        let request = GenerateRequest::new(model_id, req.prompt.as_str())
            .with_system_prompt(req.system_prompt.clone())
            .with_temperature(req.temperature);
        async move {
            match state.registry.generate(request, true).await {
                Ok(response) => {
                    let estimated_cost =
                        record_usage(state, &response, operation::MODEL_COMPARISON).await;
                    serde_json::json!({
                        "model": model_id,
                        "content": response.content,
                        "tokens": {
                            "input": response.input_tokens,
                            "output": response.output_tokens,
                        },
                        "estimated_cost": estimated_cost,
                        "provider": response.provider,
                    })
                }
                Err(e) => {
                    tracing::warn!(model = %model_id, error = %e, "comparison run failed");
                    serde_json::json!({
                        "model": model_id,
                        "error": e.to_string(),
                        "status": "failed",
                    })
                }
            }
        }
    });

    // join_all keeps input order.
    let results = futures_util::future::join_all(runs).await;
    let count = results.len();
    Json(serde_json::json!({
        "comparison": results,
        "count": count,
    }))
    .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/drafts
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct ListDraftsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default = "d_limit")]
    pub limit: usize,
}

fn d_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

pub async fn list_drafts(
    State(state): State<AppState>,
    Query(query): Query<ListDraftsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let drafts = state
        .drafts
        .list_drafts(query.status.as_deref(), query.limit)
        .await?;
    let count = drafts.len();
    Ok(Json(serde_json::json!({
        "drafts": drafts,
        "count": count,
    })))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/drafts/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.drafts.get_draft(id).await? {
        Some(draft) => Ok(Json(serde_json::json!({ "draft": draft }))),
        None => Err(Error::NotFound(format!("draft {id}")).into()),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET|POST /api/drafts/:id/versions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn list_versions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let versions = state.drafts.list_versions(id).await?;
    let count = versions.len();
    Ok(Json(serde_json::json!({
        "versions": versions,
        "count": count,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub content: String,
    #[serde(default)]
    pub changes_summary: Option<String>,
}

pub async fn create_version(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateVersionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let version = state
        .drafts
        .create_version(id, req.content, req.changes_summary)
        .await?;
    TraceEvent::DraftSaved {
        draft_id: id.to_string(),
        version: version.version_number,
    }
    .emit();
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "version": version })),
    ))
}
