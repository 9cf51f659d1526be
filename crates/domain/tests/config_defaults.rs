use ch_domain::config::{Config, ConfigSeverity, StoreBackend};
use ch_domain::model::ProviderName;

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8000);
}

#[test]
fn explicit_zero_host_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
}

#[test]
fn default_credential_env_vars() {
    let config = Config::default();
    assert_eq!(config.models.key_env(ProviderName::OpenRouter), "OPENROUTER_API_KEY");
    assert_eq!(config.models.key_env(ProviderName::OpenAi), "OPENAI_API_KEY");
    assert_eq!(config.models.key_env(ProviderName::Anthropic), "ANTHROPIC_API_KEY");
}

#[test]
fn credential_env_vars_can_be_renamed() {
    let toml_str = r#"
[models]
catalog_path = "/etc/chitthi/models.yaml"
openai_key_env = "CORP_OPENAI_KEY"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.models.key_env(ProviderName::OpenAi), "CORP_OPENAI_KEY");
    assert_eq!(config.models.key_env(ProviderName::OpenRouter), "OPENROUTER_API_KEY");
    assert_eq!(
        config.models.catalog_path,
        std::path::PathBuf::from("/etc/chitthi/models.yaml")
    );
}

#[test]
fn store_defaults_to_memory() {
    let config = Config::default();
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.store.api_key_env, "SUPABASE_KEY");
}

#[test]
fn postgrest_without_url_is_an_error() {
    let toml_str = r#"
[store]
backend = "postgrest"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "store.url" && i.severity == ConfigSeverity::Error));
}

#[test]
fn missing_catalog_is_only_a_warning() {
    let mut config = Config::default();
    config.models.catalog_path = "/nonexistent/models.yaml".into();
    let issues = config.validate();
    let catalog_issue = issues
        .iter()
        .find(|i| i.field == "models.catalog_path")
        .expect("catalog issue reported");
    assert_eq!(catalog_issue.severity, ConfigSeverity::Warning);
}

#[test]
fn zero_port_is_an_error() {
    let mut config = Config::default();
    config.server.port = 0;
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "server.port" && i.severity == ConfigSeverity::Error));
}

#[test]
fn drafts_defaults() {
    let config = Config::default();
    assert_eq!(config.drafts.default_max_tokens, 2000);
    assert!(config.drafts.default_system_prompt.contains("Hinglish"));
}

#[test]
fn observability_is_off_unless_endpoint_set() {
    let config: Config = toml::from_str("[observability]\nsample_rate = 0.25\n").unwrap();
    assert!(config.observability.otlp_endpoint.is_none());
    assert_eq!(config.observability.service_name, "chitthi");
    assert!((config.observability.sample_rate - 0.25).abs() < f64::EPSILON);
}

#[test]
fn sample_rate_out_of_range_is_an_error() {
    let mut config = Config::default();
    config.observability.sample_rate = 1.5;
    assert!(config
        .validate()
        .iter()
        .any(|i| i.field == "observability.sample_rate" && i.severity == ConfigSeverity::Error));
}

#[test]
fn shipped_samples_parse() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");

    let raw = std::fs::read_to_string(root.join("config.toml")).unwrap();
    let config: Config = toml::from_str(&raw).unwrap();
    assert_eq!(config.store.backend, StoreBackend::Memory);

    let catalog = ch_domain::config::ModelCatalog::load(&root.join("config/models.yaml")).unwrap();
    for name in ProviderName::ALL {
        let section = catalog.section(name);
        assert!(section.enabled, "{name} disabled in sample catalog");
        assert!(!section.models.is_empty());
    }
    assert_eq!(catalog.section(ProviderName::Anthropic).timeout_secs, Some(90));
}
