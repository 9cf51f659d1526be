use ch_domain::config::{Config, ConfigSeverity, StoreBackend};
use ch_domain::model::ProviderName;
use ch_providers::Credentials;

use crate::bootstrap;

/// Run all diagnostic checks and print a summary.
///
/// Returns `Ok(true)` when every check passes, `Ok(false)` when at least
/// one check failed.
pub async fn run(config: &Config, config_path: &str) -> anyhow::Result<bool> {
    println!("chitthi doctor");
    println!("==============\n");

    let mut all_passed = true;

    // 1. Config file
    check_config_file(config_path, &mut all_passed);

    // 2. Config validation
    check_config_validation(config, &mut all_passed);

    // 3. Model catalog + credentials
    check_providers(config, &mut all_passed);

    // 4. Registered providers answer a probe
    check_connectivity(config, &mut all_passed).await;

    // 5. Store backend
    check_store(config, &mut all_passed).await;

    // Summary
    println!();
    if all_passed {
        println!("All checks passed.");
    } else {
        println!("Some checks failed. Review the output above.");
    }

    Ok(all_passed)
}

// ── Individual checks ─────────────────────────────────────────────────

fn check_config_file(config_path: &str, all_passed: &mut bool) {
    let exists = std::path::Path::new(config_path).exists();
    print_check(
        "Config file exists",
        exists,
        if exists {
            config_path.to_owned()
        } else {
            format!("{config_path} not found (using defaults)")
        },
    );
    if !exists {
        *all_passed = false;
    }
}

fn check_config_validation(config: &Config, all_passed: &mut bool) {
    let issues = config.validate();
    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();

    if issues.is_empty() {
        print_check("Config validation", true, "no issues".into());
    } else {
        print_check(
            "Config validation",
            error_count == 0,
            format!("{} issue(s) ({} error(s))", issues.len(), error_count),
        );
        for issue in &issues {
            println!("      {issue}");
        }
        if error_count > 0 {
            *all_passed = false;
        }
    }
}

fn check_providers(config: &Config, all_passed: &mut bool) {
    let catalog = bootstrap::load_catalog(&config.models);
    let credentials = Credentials::from_env(&config.models);

    let mut usable = 0;
    for name in ProviderName::ALL {
        let section = catalog.section(name);
        let env = config.models.key_env(name);
        let has_key = credentials.get(name).is_some();
        let detail = match (section.enabled, has_key) {
            (false, _) => "disabled in catalog".to_owned(),
            (true, false) => format!("{env} not set"),
            (true, true) => format!("{} model(s)", section.models.len()),
        };
        if section.enabled && has_key {
            usable += 1;
        }
        // A disabled vendor is a choice, not a failure.
        print_check(
            &format!("Provider {name}"),
            !section.enabled || has_key,
            detail,
        );
    }

    if usable == 0 {
        print_check(
            "Usable providers",
            false,
            "none; every generation will fail".into(),
        );
        *all_passed = false;
    }
}

async fn check_connectivity(config: &Config, all_passed: &mut bool) {
    let registry = bootstrap::build_registry(&config.models);
    for name in registry.list_providers() {
        let status = registry.probe(name.as_str()).await;
        let ok = status.is_accessible();
        let detail = match status {
            ch_providers::ConnectionStatus::Accessible => "reachable".to_owned(),
            ch_providers::ConnectionStatus::Unreachable(reason) => reason,
        };
        print_check(&format!("Probe {name}"), ok, detail);
        if !ok {
            *all_passed = false;
        }
    }
}

async fn check_store(config: &Config, all_passed: &mut bool) {
    let label = match config.store.backend {
        StoreBackend::Memory => "memory (not persisted)".to_owned(),
        StoreBackend::Postgrest => format!(
            "postgrest {}",
            config.store.url.as_deref().unwrap_or("(no url)")
        ),
    };
    let result = match ch_store::create_store(&config.store) {
        Ok(stores) => stores.content.ping().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => print_check("Store backend", true, label),
        Err(e) => {
            print_check("Store backend", false, format!("{label}: {e}"));
            *all_passed = false;
        }
    }
}

// ── Formatting helper ─────────────────────────────────────────────────

fn print_check(name: &str, passed: bool, detail: String) {
    let status = if passed { "PASS" } else { "FAIL" };
    println!("  [{status}] {name}: {detail}");
}
