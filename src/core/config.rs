//! Configuration parsing and validation.
//!
//! Client configuration is loaded from TOML files with CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cluster endpoints and dialing.
    pub cluster: ClusterConfig,

    /// Per-request defaults.
    #[serde(default)]
    pub requests: RequestConfig,

    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Cluster endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// gRPC endpoints (e.g., "http://127.0.0.1:2379").
    pub endpoints: Vec<String>,

    /// Timeout for establishing a replacement connection, in milliseconds.
    #[serde(default = "default_dial_timeout_ms")]
    pub dial_timeout_ms: u64,
}

impl ClusterConfig {
    /// Dial timeout as a Duration.
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }
}

/// Per-request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Deadline applied to each CLI request, in milliseconds (0 = none).
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl RequestConfig {
    /// Request timeout, or None when requests are unbounded.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_dial_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Configuration for a list of endpoints with every other setting defaulted.
    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        Self {
            cluster: ClusterConfig {
                endpoints,
                dial_timeout_ms: default_dial_timeout_ms(),
            },
            requests: RequestConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config = Self::parse_file(path)?;
        config
            .validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Load and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config = Self::parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file without validating its values.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse_toml(&content).with_context(|| format!("invalid config: {}", path.display()))
    }

    /// Parse a TOML string without validating its values.
    pub fn parse_toml(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "failed to parse config")
    }

    /// Apply CLI overrides to the configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref endpoints) = overrides.endpoints {
            self.cluster.endpoints = endpoints.clone();
        }
        if let Some(ref log_level) = overrides.log_level {
            self.telemetry.log_level = log_level.clone();
        }
        if let Some(timeout_ms) = overrides.request_timeout_ms {
            self.requests.timeout_ms = timeout_ms;
        }
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<()> {
        self.validate_cluster()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_cluster(&self) -> Result<()> {
        if self.cluster.endpoints.is_empty() {
            anyhow::bail!("cluster.endpoints must list at least one endpoint");
        }

        for endpoint in &self.cluster.endpoints {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                anyhow::bail!(
                    "cluster.endpoints entries must start with http:// or https://, got: {}",
                    endpoint
                );
            }
        }

        if self.cluster.dial_timeout_ms == 0 {
            anyhow::bail!("cluster.dial_timeout_ms must be > 0");
        }

        Ok(())
    }

    fn validate_telemetry(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.telemetry.log_level.as_str()) {
            anyhow::bail!(
                "telemetry.log_level must be one of {:?}, got: {}",
                valid_levels,
                self.telemetry.log_level
            );
        }
        Ok(())
    }
}

/// CLI override options that can be applied to configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Override endpoint list.
    pub endpoints: Option<Vec<String>>,
    /// Override log level.
    pub log_level: Option<String>,
    /// Override request timeout.
    pub request_timeout_ms: Option<u64>,
}
