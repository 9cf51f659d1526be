//! Model-id to provider dispatch.
//!
//! An ordered rule table: the first rule whose matcher accepts the id picks
//! the target. Vendor-qualified ids always go through OpenRouter; bare
//! OpenAI or Claude names prefer the direct vendor when it is registered.

use ch_domain::model::ProviderName;

/// Where a matched rule sends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Always this provider, registered or not.
    Fixed(ProviderName),
    /// `preferred` if registered, `otherwise` regardless.
    PreferRegistered {
        preferred: ProviderName,
        otherwise: ProviderName,
    },
    /// This provider if registered, no provider otherwise.
    IfRegistered(ProviderName),
}

pub struct RouteRule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub target: Target,
}

pub const RULES: &[RouteRule] = &[
    RouteRule {
        name: "openrouter-prefix",
        matches: has_openrouter_prefix,
        target: Target::Fixed(ProviderName::OpenRouter),
    },
    RouteRule {
        name: "gpt-family",
        matches: is_gpt_family,
        target: Target::PreferRegistered {
            preferred: ProviderName::OpenAi,
            otherwise: ProviderName::OpenRouter,
        },
    },
    RouteRule {
        name: "claude-family",
        matches: is_claude_family,
        target: Target::PreferRegistered {
            preferred: ProviderName::Anthropic,
            otherwise: ProviderName::OpenRouter,
        },
    },
    RouteRule {
        name: "default",
        matches: any_model,
        target: Target::IfRegistered(ProviderName::OpenRouter),
    },
];

const OPENROUTER_PREFIXES: [&str; 3] = ["openai/", "anthropic/", "meta-llama/"];

fn any_model(_: &str) -> bool {
    true
}

fn has_openrouter_prefix(model_id: &str) -> bool {
    OPENROUTER_PREFIXES.iter().any(|p| model_id.starts_with(p))
}

fn is_gpt_family(model_id: &str) -> bool {
    let lower = model_id.to_lowercase();
    lower.contains("gpt-3") || lower.contains("gpt-4")
}

fn is_claude_family(model_id: &str) -> bool {
    model_id.to_lowercase().contains("claude")
}

/// Pick the provider for `model_id`. `is_registered` reports whether the
/// registry holds an adapter for a given provider.
///
/// The result may name a provider that is not registered (the `Fixed` and
/// `otherwise` arms); the caller reports that as unavailable.
pub fn resolve(model_id: &str, is_registered: impl Fn(ProviderName) -> bool) -> Option<ProviderName> {
    let rule = RULES.iter().find(|r| (r.matches)(model_id))?;
    let target = match rule.target {
        Target::Fixed(p) => Some(p),
        Target::PreferRegistered {
            preferred,
            otherwise,
        } => Some(if is_registered(preferred) {
            preferred
        } else {
            otherwise
        }),
        Target::IfRegistered(p) => is_registered(p).then_some(p),
    };
    tracing::trace!(model = %model_id, rule = rule.name, target = ?target, "resolved model");
    target
}

// ── Fallback helpers ───────────────────────────────────────────────

/// The vendor-local name for a cross-vendor id: everything after the first
/// `/`, or the id unchanged.
pub fn vendor_local_name(model_id: &str) -> &str {
    model_id
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or(model_id)
}

/// Direct vendor to retry on when OpenRouter fails for `model_id`.
///
/// OpenAI is tried for ids mentioning `openai`, else Anthropic for ids
/// mentioning `claude`, each only when registered. At most one candidate.
pub fn fallback_target(
    model_id: &str,
    is_registered: impl Fn(ProviderName) -> bool,
) -> Option<ProviderName> {
    let lower = model_id.to_lowercase();
    if lower.contains("openai") && is_registered(ProviderName::OpenAi) {
        Some(ProviderName::OpenAi)
    } else if lower.contains("claude") && is_registered(ProviderName::Anthropic) {
        Some(ProviderName::Anthropic)
    } else {
        None
    }
}
