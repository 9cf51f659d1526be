use serde::Serialize;

/// Structured trace events emitted across all chitthi crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ProviderRegistered {
        provider: String,
        models: usize,
    },
    LlmRequest {
        provider: String,
        model: String,
        duration_ms: u64,
        success: bool,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
    },
    LlmFallback {
        from_provider: String,
        to_provider: String,
        model: String,
        reason: String,
    },
    UsageRecorded {
        provider: String,
        model: String,
        operation_type: String,
        cost_estimated: f64,
    },
    DraftSaved {
        draft_id: String,
        version: u32,
    },
    StoreCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "ch_event");
    }
}
