//! `chitthi models | test | generate`: one-shot registry commands.
//!
//! These build only the model registry; no store, no server.

use ch_domain::config::Config;
use ch_domain::model::ProviderName;
use ch_providers::{ConnectionStatus, GenerateRequest, ModelRegistry};

use crate::bootstrap;

/// Print every catalog model the registered providers expose.
pub async fn list(config: &Config) -> anyhow::Result<()> {
    let registry = bootstrap::build_registry(&config.models);
    print_providers(&registry);

    let models = registry.get_all_models().await;
    if models.is_empty() {
        println!("\nNo models available.");
        return Ok(());
    }

    println!();
    for m in &models {
        let marker = if m.available { " " } else { "!" };
        println!(
            "{marker} {:<40} {:<11} in ${:.4}/1k  out ${:.4}/1k  {}",
            m.id,
            m.provider.as_str(),
            m.cost_per_1k_input,
            m.cost_per_1k_output,
            m.display_name
        );
    }
    println!("\n{} model(s)", models.len());
    Ok(())
}

/// Probe one provider, or the provider `model` resolves to. Returns
/// whether the probe succeeded.
pub async fn test(
    config: &Config,
    provider: Option<String>,
    model: Option<String>,
) -> anyhow::Result<bool> {
    let registry = bootstrap::build_registry(&config.models);

    let targets: Vec<String> = match (provider, model) {
        (Some(p), _) => vec![p],
        (None, Some(m)) => match registry.resolve(&m) {
            Some(p) => {
                println!("{m} -> {p}");
                vec![p.to_string()]
            }
            None => anyhow::bail!("no provider resolves model '{m}'"),
        },
        (None, None) => ProviderName::ALL.iter().map(|p| p.to_string()).collect(),
    };

    let mut all_ok = true;
    for name in targets {
        match registry.probe(&name).await {
            ConnectionStatus::Accessible => println!("  [PASS] {name}"),
            ConnectionStatus::Unreachable(reason) => {
                println!("  [FAIL] {name}: {reason}");
                all_ok = false;
            }
        }
    }
    Ok(all_ok)
}

/// Run one generation through the registry and print the reply.
pub async fn generate(
    config: &Config,
    model: String,
    system: Option<String>,
    prompt: String,
    use_fallback: bool,
) -> anyhow::Result<()> {
    let registry = bootstrap::build_registry(&config.models);
    let request = GenerateRequest::new(model, prompt).with_system_prompt(system);

    let response = registry.generate(request, use_fallback).await?;
    let cost = registry.estimate_cost(
        response.input_tokens,
        response.output_tokens,
        &response.model,
    );

    println!("{}", response.content);
    eprintln!(
        "\n[{} via {}] {} in / {} out tokens, ~${cost:.6}",
        response.model, response.provider, response.input_tokens, response.output_tokens
    );
    Ok(())
}

// ── Internal helpers ────────────────────────────────────────────────

fn print_providers(registry: &ModelRegistry) {
    let providers = registry.list_providers();
    let names: Vec<&str> = providers.iter().map(|p| p.as_str()).collect();
    if names.is_empty() {
        println!("Registered providers: none (check API key env vars)");
    } else {
        println!("Registered providers: {}", names.join(", "));
    }
}
