//! Config command implementation.

use crate::core::config::Config;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};

/// Configuration operations.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Validate the effective configuration.
    Validate,
    /// Print the effective configuration.
    Show,
    /// Print a configuration template.
    Generate,
}

/// Run the config command against an already loaded configuration.
pub fn run_config(config: &Config, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Validate => {
            config
                .validate()
                .context("configuration is invalid")?;
            println!("✓ Configuration is valid");
            println!("  endpoints: {}", config.cluster.endpoints.join(", "));
            Ok(())
        }
        ConfigCommand::Show => {
            println!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
        ConfigCommand::Generate => {
            println!("{}", generate_template());
            Ok(())
        }
    }
}

fn generate_template() -> String {
    r#"# Lattice KV client configuration

[cluster]
endpoints = ["http://127.0.0.1:2379", "http://127.0.0.1:22379", "http://127.0.0.1:32379"]
dial_timeout_ms = 5000

[requests]
timeout_ms = 5000

[telemetry]
log_level = "info"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_is_a_valid_config() {
        let config = Config::from_toml(&generate_template()).unwrap();
        assert_eq!(config.cluster.endpoints.len(), 3);
    }

    #[test]
    fn validate_reports_invalid_config() {
        let mut config = Config::with_endpoints(vec!["http://10.0.0.1:2379".to_string()]);
        config.telemetry.log_level = "loud".to_string();
        let args = ConfigArgs {
            command: ConfigCommand::Validate,
        };
        let err = run_config(&config, args).unwrap_err();
        assert!(err.to_string().contains("configuration is invalid"));

        let config = Config::with_endpoints(vec!["http://10.0.0.1:2379".to_string()]);
        let args = ConfigArgs {
            command: ConfigCommand::Validate,
        };
        assert!(run_config(&config, args).is_ok());
    }

    #[test]
    fn show_output_round_trips() {
        let config = Config::with_endpoints(vec!["http://10.0.0.1:2379".to_string()]);
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&rendered).unwrap();
        assert_eq!(parsed.cluster.endpoints, config.cluster.endpoints);
    }
}
