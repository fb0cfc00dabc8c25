//! Endpoint pool that dials replacement connections.
//!
//! The pool keeps the configured endpoint list. Rotation walks the ring
//! starting after the endpoint that failed and tries the failed endpoint
//! last, since it may have recovered by the time every other member has
//! been tried.

use super::grpc::GrpcConnection;
use super::{Connection, ConnectionPool};
use crate::core::config::ClusterConfig;
use crate::core::error::{ClientError, ClientResult};
use std::time::Duration;

/// Round-robin pool over a fixed endpoint list.
#[derive(Debug)]
pub struct EndpointPool {
    endpoints: Vec<String>,
    dial_timeout: Duration,
    initial: GrpcConnection,
}

impl EndpointPool {
    /// Build a pool from cluster configuration.
    ///
    /// The initial connection to the first endpoint is lazy, so this
    /// succeeds even while the cluster is unreachable. Must be called from
    /// within a tokio runtime.
    pub fn new(config: &ClusterConfig) -> ClientResult<Self> {
        let first = config
            .endpoints
            .first()
            .ok_or_else(|| ClientError::rotation("no endpoints configured"))?;
        let initial = GrpcConnection::lazy(first, config.dial_timeout())?;
        Ok(Self {
            endpoints: config.endpoints.clone(),
            dial_timeout: config.dial_timeout(),
            initial,
        })
    }

    /// Configured endpoints.
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Endpoints to try after `failed`, in order.
    pub fn rotation_order(&self, failed: &str) -> Vec<&str> {
        let start = self
            .endpoints
            .iter()
            .position(|e| e == failed)
            .map(|i| i + 1)
            .unwrap_or(0);
        let n = self.endpoints.len();
        let mut order: Vec<&str> = (0..n)
            .map(|offset| self.endpoints[(start + offset) % n].as_str())
            .collect();
        // The failed endpoint goes last.
        if let Some(pos) = order.iter().position(|e| *e == failed) {
            let failed = order.remove(pos);
            order.push(failed);
        }
        order
    }
}

impl ConnectionPool for EndpointPool {
    type Conn = GrpcConnection;

    fn active_connection(&self) -> GrpcConnection {
        self.initial.clone()
    }

    async fn retry_connection(
        &self,
        failed: &GrpcConnection,
        cause: &ClientError,
    ) -> ClientResult<GrpcConnection> {
        tracing::debug!(
            endpoint = %failed.endpoint(),
            error = %cause,
            "looking for replacement connection"
        );

        let mut last_error = None;
        for endpoint in self.rotation_order(failed.endpoint()) {
            match GrpcConnection::connect(endpoint, self.dial_timeout).await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "endpoint dial failed");
                    last_error = Some(e);
                }
            }
        }

        Err(ClientError::rotation(match last_error {
            Some(e) => format!("all {} endpoints unreachable: {}", self.endpoints.len(), e),
            None => "no endpoints configured".to_string(),
        }))
    }
}
