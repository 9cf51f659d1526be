pub mod config;
pub mod doctor;
pub mod models;

use clap::{Parser, Subcommand};

use ch_domain::config::Config;

/// chitthi: Hinglish newsletter engine with multi-vendor model routing.
#[derive(Debug, Parser)]
#[command(name = "chitthi", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// List catalog models and the providers that registered.
    Models,
    /// Probe a provider, or the provider a model resolves to.
    Test {
        /// Provider name (openrouter, openai, anthropic).
        #[arg(long, conflicts_with = "model")]
        provider: Option<String>,
        /// Model identifier, e.g. "openai/gpt-4-turbo".
        #[arg(long)]
        model: Option<String>,
    },
    /// Run one generation and print the result.
    Generate {
        /// Model identifier to route.
        #[arg(long)]
        model: String,
        /// Optional system prompt.
        #[arg(long)]
        system: Option<String>,
        /// Disable the direct-vendor fallback.
        #[arg(long)]
        no_fallback: bool,
        /// The user prompt.
        prompt: String,
    },
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `CHITTHI_CONFIG` (or
/// `config.toml` by default). A missing file yields the defaults.
/// Returns the parsed [`Config`] and the path that was used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("CHITTHI_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_prompt_and_flags() {
        let cli = Cli::try_parse_from([
            "chitthi",
            "generate",
            "--model",
            "openai/gpt-4-turbo",
            "--system",
            "be brief",
            "namaste",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Generate {
                model,
                system,
                no_fallback,
                prompt,
            }) => {
                assert_eq!(model, "openai/gpt-4-turbo");
                assert_eq!(system.as_deref(), Some("be brief"));
                assert!(!no_fallback);
                assert_eq!(prompt, "namaste");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_both_provider_and_model() {
        assert!(Cli::try_parse_from([
            "chitthi",
            "test",
            "--provider",
            "openai",
            "--model",
            "gpt-4"
        ])
        .is_err());
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let config = load_config_from("/nonexistent/chitthi.toml").unwrap();
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9100\n").unwrap();
        let config = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(load_config_from(path.to_str().unwrap()).is_err());
    }
}
