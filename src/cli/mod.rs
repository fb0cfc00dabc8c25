//! Command-line interface.
//!
//! `lattice-kv` issues single KV requests against a cluster.

pub mod commands;

use crate::core::config::{Config, ConfigOverrides};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Endpoint used when neither a config file nor `--endpoints` is given.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:2379";

/// Lattice KV client.
#[derive(Parser, Debug)]
#[command(name = "lattice-kv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Comma-separated cluster endpoints (overrides the config file).
    #[arg(long, global = true, value_delimiter = ',')]
    pub endpoints: Option<Vec<String>>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Per-request timeout in milliseconds (0 = none).
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Print client metrics in Prometheus text format after the command.
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read a key or a range of keys.
    Get(commands::GetArgs),
    /// Write a key.
    Put(commands::PutArgs),
    /// Delete a key or a range of keys.
    Del(commands::DelArgs),
    /// Compact history before a revision.
    Compact(commands::CompactArgs),
    /// Configuration operations.
    Config(commands::ConfigArgs),
}

impl Cli {
    /// Overrides collected from global flags.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoints: self.endpoints.clone(),
            log_level: self.log_level.clone(),
            request_timeout_ms: self.timeout_ms,
        }
    }

    /// Load the config file, or defaults, apply flag overrides and validate.
    pub fn load_config(&self) -> Result<Config> {
        let config = self.load_config_unvalidated()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Cli::load_config`] but leaves validation to the caller.
    ///
    /// `config validate` reports problems itself, so it loads through here.
    pub fn load_config_unvalidated(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::parse_file(path)?,
            None => Config::with_endpoints(vec![DEFAULT_ENDPOINT.to_string()]),
        };
        config.apply_overrides(&self.overrides());
        Ok(config)
    }
}

/// Initialize tracing subscriber if the telemetry feature is enabled.
///
/// `RUST_LOG` takes precedence over `level`.
#[cfg(feature = "telemetry")]
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_level: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_flag_splits_on_commas() {
        let cli = Cli::parse_from([
            "lattice-kv",
            "--endpoints",
            "http://a:2379,http://b:2379",
            "get",
            "foo",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(
            config.cluster.endpoints,
            vec!["http://a:2379".to_string(), "http://b:2379".to_string()]
        );
    }

    #[test]
    fn defaults_to_local_endpoint() {
        let cli = Cli::parse_from(["lattice-kv", "compact", "5"]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.cluster.endpoints, vec![DEFAULT_ENDPOINT.to_string()]);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let cli = Cli::parse_from(["lattice-kv", "--log-level", "loud", "get", "foo"]);
        assert!(cli.load_config().is_err());
    }

    #[test]
    fn unvalidated_load_keeps_bad_values() {
        let cli = Cli::parse_from([
            "lattice-kv",
            "--log-level",
            "loud",
            "config",
            "validate",
        ]);
        let config = cli.load_config_unvalidated().unwrap();
        assert_eq!(config.telemetry.log_level, "loud");
        assert!(config.validate().is_err());
    }

    #[test]
    fn metrics_flag_is_global() {
        let cli = Cli::parse_from(["lattice-kv", "get", "foo", "--metrics"]);
        assert!(cli.metrics);
        let cli = Cli::parse_from(["lattice-kv", "get", "foo"]);
        assert!(!cli.metrics);
    }
}
