//! Usage and cost aggregation over [`UsageRecord`]s.
//!
//! Pure functions; the caller fetches records through a
//! [`UsageTracker`](crate::usage::UsageTracker) and hands them in.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::usage::UsageRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProviderUsage {
    pub cost: f64,
    pub requests: u64,
    pub tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationUsage {
    pub cost: f64,
    pub requests: u64,
}

/// Windowed usage summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageStats {
    pub total_requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    pub total_cost: f64,
    pub by_provider: BTreeMap<String, ProviderUsage>,
    pub by_operation: BTreeMap<String, OperationUsage>,
    pub period_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderCost {
    pub total: f64,
    pub count: u64,
    pub avg_per_request: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCost {
    pub total: f64,
    pub count: u64,
}

/// All-time cost breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub total_cost: f64,
    pub total_requests: u64,
    pub by_provider: BTreeMap<String, ProviderCost>,
    /// Keyed `provider:model`.
    pub by_model: BTreeMap<String, ModelCost>,
    pub period: &'static str,
}

/// Round a USD amount to six decimals.
pub fn round6(v: f64) -> f64 {
    (v * 1_000_000.0).round() / 1_000_000.0
}

pub fn usage_stats(records: &[UsageRecord], period_days: u32) -> UsageStats {
    let mut by_provider: BTreeMap<String, ProviderUsage> = BTreeMap::new();
    let mut by_operation: BTreeMap<String, OperationUsage> = BTreeMap::new();
    let (mut input, mut output, mut cost) = (0u64, 0u64, 0.0f64);

    for r in records {
        input += r.input_tokens as u64;
        output += r.output_tokens as u64;
        cost += r.cost_estimated;

        let p = by_provider.entry(r.provider.clone()).or_default();
        p.cost += r.cost_estimated;
        p.requests += 1;
        p.tokens += r.total_tokens();

        let o = by_operation.entry(r.operation_type.clone()).or_default();
        o.cost += r.cost_estimated;
        o.requests += 1;
    }

    for p in by_provider.values_mut() {
        p.cost = round6(p.cost);
    }
    for o in by_operation.values_mut() {
        o.cost = round6(o.cost);
    }

    UsageStats {
        total_requests: records.len() as u64,
        total_input_tokens: input,
        total_output_tokens: output,
        total_tokens: input + output,
        total_cost: round6(cost),
        by_provider,
        by_operation,
        period_days,
    }
}

pub fn cost_breakdown(records: &[UsageRecord]) -> CostBreakdown {
    let mut providers: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    let mut models: BTreeMap<String, (f64, u64)> = BTreeMap::new();
    let mut total = 0.0f64;

    for r in records {
        total += r.cost_estimated;
        let p = providers.entry(r.provider.clone()).or_default();
        p.0 += r.cost_estimated;
        p.1 += 1;
        let m = models
            .entry(format!("{}:{}", r.provider, r.model))
            .or_default();
        m.0 += r.cost_estimated;
        m.1 += 1;
    }

    CostBreakdown {
        total_cost: round6(total),
        total_requests: records.len() as u64,
        by_provider: providers
            .into_iter()
            .map(|(k, (sum, count))| {
                let avg = if count > 0 { sum / count as f64 } else { 0.0 };
                (
                    k,
                    ProviderCost {
                        total: round6(sum),
                        count,
                        avg_per_request: round6(avg),
                    },
                )
            })
            .collect(),
        by_model: models
            .into_iter()
            .map(|(k, (sum, count))| {
                (
                    k,
                    ModelCost {
                        total: round6(sum),
                        count,
                    },
                )
            })
            .collect(),
        period: "all_time",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<UsageRecord> {
        vec![
            UsageRecord::new("openrouter", "openai/gpt-4-turbo", "generate", 100, 50, 0.0025),
            UsageRecord::new("openrouter", "openai/gpt-4-turbo", "draft_generation", 1000, 800, 0.034),
            UsageRecord::new("anthropic", "claude-3-opus", "generate", 10, 10, 0.0009),
        ]
    }

    #[test]
    fn empty_window_is_all_zero() {
        let stats = usage_stats(&[], 7);
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.total_cost, 0.0);
        assert!(stats.by_provider.is_empty());
        assert_eq!(stats.period_days, 7);
    }

    #[test]
    fn usage_groups_by_provider_and_operation() {
        let stats = usage_stats(&records(), 30);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.total_input_tokens, 1110);
        assert_eq!(stats.total_output_tokens, 860);
        assert_eq!(stats.total_tokens, 1970);
        assert!((stats.total_cost - 0.0374).abs() < 1e-9);

        let or = &stats.by_provider["openrouter"];
        assert_eq!(or.requests, 2);
        assert_eq!(or.tokens, 1950);
        assert!((or.cost - 0.0365).abs() < 1e-9);

        assert_eq!(stats.by_operation["generate"].requests, 2);
        assert_eq!(stats.by_operation["draft_generation"].requests, 1);
    }

    #[test]
    fn costs_are_rounded_to_six_places() {
        assert_eq!(round6(0.123_456_789), 0.123457);
        let recs = vec![UsageRecord::new("openai", "gpt-4", "generate", 0, 0, 1e-7)];
        assert_eq!(usage_stats(&recs, 30).total_cost, 0.0);
    }

    #[test]
    fn breakdown_keys_models_by_provider() {
        let b = cost_breakdown(&records());
        assert_eq!(b.total_requests, 3);
        assert_eq!(b.period, "all_time");
        assert_eq!(b.by_model["openrouter:openai/gpt-4-turbo"].count, 2);
        assert_eq!(b.by_model["anthropic:claude-3-opus"].count, 1);
        let or = &b.by_provider["openrouter"];
        assert!((or.avg_per_request - 0.01825).abs() < 1e-9);
    }
}
