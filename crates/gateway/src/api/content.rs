//! Content items, embeddings and similarity search.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use uuid::Uuid;

use ch_domain::error::Error;
use ch_domain::model::Embedding;
use ch_providers::pricing::embedding_cost;
use ch_store::content::{DEFAULT_MATCH_LIMIT, DEFAULT_MATCH_THRESHOLD};
use ch_store::usage::operation;
use ch_store::{track, NewContentItem, TrackOutcome, UsageRecord};

use super::error::ApiError;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// POST /api/content
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Store a content item and embed its summary (or extracted text).
///
/// The item is kept even when embedding fails; `embedding_status` says
/// which of `created`, `skipped` or `failed` happened.
pub async fn create_content(
    State(state): State<AppState>,
    Json(req): Json<NewContentItem>,
) -> Result<Response, ApiError> {
    let item = state.content.create_content(req).await?;
    let mut body = serde_json::to_value(&item).map_err(Error::from)?;

    let Some(text) = item.embedding_text() else {
        body["embedding_status"] = "skipped".into();
        body["reason"] = "no text available for embedding".into();
        return Ok((StatusCode::CREATED, Json(body)).into_response());
    };

    let stored = match state.registry.embed(text).await {
        Ok(embedding) => {
            record_embedding_usage(&state, &embedding).await;
            state
                .content
                .store_embedding(item.id, embedding.vector, &embedding.model)
                .await
        }
        Err(e) => Err(e),
    };

    match stored {
        Ok(row) => {
            body["embedding_status"] = "created".into();
            body["embedding_id"] = serde_json::json!(row.id);
        }
        Err(e) => {
            tracing::warn!(content_id = %item.id, error = %e, "embedding failed");
            body["embedding_status"] = "failed".into();
            body["error"] = e.to_string().into();
        }
    }
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/content/:id
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let item = state
        .content
        .get_content(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("content item {id}")))?;
    Ok(Json(item).into_response())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/content/search
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "d_limit")]
    pub limit: usize,
    #[serde(default = "d_threshold")]
    pub threshold: f32,
}

fn d_limit() -> usize {
    DEFAULT_MATCH_LIMIT
}

fn d_threshold() -> f32 {
    DEFAULT_MATCH_THRESHOLD
}

pub async fn search_content(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let embedding = state.registry.embed(&params.query).await?;
    record_embedding_usage(&state, &embedding).await;

    let results = state
        .content
        .match_content(&embedding.vector, params.threshold, params.limit)
        .await?;
    let count = results.len();
    Ok(Json(serde_json::json!({
        "query": params.query,
        "results": results,
        "count": count,
        "threshold": params.threshold,
    })))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /api/db/test
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Always 200; a failed read is reported in the body.
pub async fn test_store(State(state): State<AppState>) -> impl IntoResponse {
    match state.content.ping().await {
        Ok(()) => Json(serde_json::json!({
            "status": "connected",
            "message": "store connection successful",
            "tables_accessible": true,
        })),
        Err(e) => {
            tracing::warn!(error = %e, "store connection test failed");
            Json(serde_json::json!({
                "status": "error",
                "message": e.to_string(),
                "tables_accessible": false,
            }))
        }
    }
}

// ── Internal helpers ────────────────────────────────────────────────

async fn record_embedding_usage(state: &AppState, embedding: &Embedding) {
    let record = UsageRecord::new(
        embedding.provider.as_str(),
        &embedding.model,
        operation::EMBEDDING,
        embedding.input_tokens,
        0,
        embedding_cost(embedding.input_tokens),
    );
    if let TrackOutcome::Dropped(reason) = track(state.usage.as_ref(), record).await {
        tracing::debug!(reason = %reason, "embedding usage record dropped");
    }
}
