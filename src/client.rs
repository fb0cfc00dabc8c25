//! Client facade.
//!
//! Wires configuration, the endpoint pool, the KV dispatcher and metrics
//! together.

use crate::core::config::Config;
use crate::core::context::Context;
use crate::kv::Kv;
use crate::ops::observability::MetricsRegistry;
use crate::remote::EndpointPool;
use anyhow::{Context as _, Result};
use std::sync::Arc;

/// KV client for a configured cluster.
pub struct Client {
    config: Config,
    pool: Arc<EndpointPool>,
    kv: Kv<EndpointPool>,
}

impl Client {
    /// Build a client from validated configuration.
    ///
    /// No connection is made until the first request. Must be called from
    /// within a tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let pool = Arc::new(
            EndpointPool::new(&config.cluster).context("failed to build endpoint pool")?,
        );
        let kv = Kv::with_metrics(Arc::clone(&pool), Arc::new(MetricsRegistry::new()));
        tracing::debug!(endpoints = ?config.cluster.endpoints, "client created");
        Ok(Self { config, pool, kv })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn kv(&self) -> &Kv<EndpointPool> {
        &self.kv
    }

    pub fn pool(&self) -> &EndpointPool {
        &self.pool
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        self.kv.metrics()
    }

    /// Client metrics in Prometheus text format.
    pub fn export_metrics(&self) -> String {
        self.metrics().export_prometheus()
    }

    /// Background context bounded by the configured request timeout.
    pub fn context(&self) -> Context {
        match self.config.requests.timeout() {
            Some(timeout) => Context::background().with_timeout(timeout),
            None => Context::background(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Connection;

    #[tokio::test]
    async fn starts_on_first_endpoint() {
        let client = Client::new(Config::with_endpoints(vec![
            "http://127.0.0.1:2379".to_string(),
            "http://127.0.0.1:22379".to_string(),
        ]))
        .unwrap();
        assert_eq!(client.kv().connection().endpoint(), "http://127.0.0.1:2379");
        assert_eq!(client.pool().endpoints().len(), 2);
    }

    #[tokio::test]
    async fn context_carries_request_timeout() {
        let client = Client::new(Config::with_endpoints(vec![
            "http://127.0.0.1:2379".to_string(),
        ]))
        .unwrap();
        assert!(client.context().deadline().is_some());

        let mut config = Config::with_endpoints(vec!["http://127.0.0.1:2379".to_string()]);
        config.requests.timeout_ms = 0;
        let client = Client::new(config).unwrap();
        assert!(client.context().deadline().is_none());
    }

    #[tokio::test]
    async fn export_includes_request_counters() {
        let mut config = Config::with_endpoints(vec!["http://127.0.0.1:1".to_string()]);
        config.requests.timeout_ms = 200;
        let client = Client::new(config).unwrap();

        let err = client.kv().compact(&client.context(), 1).await.unwrap_err();
        assert!(err.is_transport() || err.is_cancellation(), "got {err:?}");

        let text = client.export_metrics();
        assert!(text.contains("lattice_client_kv_requests_total 1"), "got {text}");
    }

    #[tokio::test]
    async fn rejects_empty_endpoints() {
        assert!(Client::new(Config::with_endpoints(Vec::new())).is_err());
    }
}
