//! API usage records and the append-only sink they go to.

use async_trait::async_trait;
use ch_domain::error::Result;
use ch_domain::trace::TraceEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Values of [`UsageRecord::operation_type`] written by the gateway.
pub mod operation {
    pub const GENERATE: &str = "generate";
    pub const DRAFT_GENERATION: &str = "draft_generation";
    pub const MODEL_COMPARISON: &str = "model_comparison";
    pub const EMBEDDING: &str = "embedding";
}

/// One generation's token and cost bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub provider: String,
    pub model: String,
    /// What the call was for; one of the [`operation`] constants.
    pub operation_type: String,
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub cost_estimated: f64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        operation_type: impl Into<String>,
        input_tokens: u32,
        output_tokens: u32,
        cost_estimated: f64,
    ) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            operation_type: operation_type.into(),
            input_tokens,
            output_tokens,
            cost_estimated,
            created_at: Utc::now(),
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens as u64 + self.output_tokens as u64
    }
}

/// Filter for reading usage back.
#[derive(Debug, Clone, Default)]
pub struct UsageQuery {
    /// Only records at or after this instant.
    pub since: Option<DateTime<Utc>>,
    pub provider: Option<String>,
}

impl UsageQuery {
    pub fn matches(&self, rec: &UsageRecord) -> bool {
        self.since.map_or(true, |t| rec.created_at >= t)
            && self.provider.as_deref().map_or(true, |p| rec.provider == p)
    }
}

#[async_trait]
pub trait UsageTracker: Send + Sync {
    /// Append one record.
    async fn record(&self, rec: UsageRecord) -> Result<()>;

    /// Records matching `query`, oldest first.
    async fn usage(&self, query: &UsageQuery) -> Result<Vec<UsageRecord>>;
}

/// Result of a best-effort usage write.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Recorded,
    Dropped(String),
}

/// Append `rec`, logging and swallowing any sink failure.
pub async fn track(tracker: &dyn UsageTracker, rec: UsageRecord) -> TrackOutcome {
    let event = TraceEvent::UsageRecorded {
        provider: rec.provider.clone(),
        model: rec.model.clone(),
        operation_type: rec.operation_type.clone(),
        cost_estimated: rec.cost_estimated,
    };
    match tracker.record(rec).await {
        Ok(()) => {
            event.emit();
            TrackOutcome::Recorded
        }
        Err(e) => {
            tracing::warn!(error = %e, "usage tracking failed");
            TrackOutcome::Dropped(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn query_filters_by_provider_and_time() {
        let mut old = UsageRecord::new("openai", "gpt-4", "generate", 10, 10, 0.1);
        old.created_at = Utc::now() - Duration::days(40);
        let fresh = UsageRecord::new("openrouter", "openai/gpt-4", "generate", 1, 1, 0.01);

        let q = UsageQuery {
            since: Some(Utc::now() - Duration::days(30)),
            provider: None,
        };
        assert!(!q.matches(&old));
        assert!(q.matches(&fresh));

        let q = UsageQuery {
            since: None,
            provider: Some("openai".into()),
        };
        assert!(q.matches(&old));
        assert!(!q.matches(&fresh));
    }

    #[test]
    fn record_deserializes_with_defaults() {
        let rec: UsageRecord = serde_json::from_value(serde_json::json!({
            "provider": "anthropic",
            "model": "claude-3-opus",
            "operation_type": "generate"
        }))
        .unwrap();
        assert_eq!(rec.total_tokens(), 0);
        assert_eq!(rec.cost_estimated, 0.0);
    }
}
