//! Usage and cost reporting over the usage sink.

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

use ch_store::analytics::{cost_breakdown, usage_stats, CostBreakdown, UsageStats};
use ch_store::UsageQuery;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UsageParams {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default = "d_30")]
    pub days: u32,
}

fn d_30() -> u32 {
    30
}

/// `GET /api/analytics/usage?provider=&days=30`
pub async fn usage(
    State(state): State<AppState>,
    Query(params): Query<UsageParams>,
) -> Result<Json<UsageStats>, ApiError> {
    let query = UsageQuery {
        since: Some(Utc::now() - Duration::days(i64::from(params.days))),
        provider: params.provider,
    };
    let records = state.usage.usage(&query).await?;
    Ok(Json(usage_stats(&records, params.days)))
}

/// `GET /api/analytics/costs`: all-time totals.
pub async fn costs(State(state): State<AppState>) -> Result<Json<CostBreakdown>, ApiError> {
    let records = state.usage.usage(&UsageQuery::default()).await?;
    Ok(Json(cost_breakdown(&records)))
}
