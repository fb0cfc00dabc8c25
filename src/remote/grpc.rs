//! tonic-backed connection and KV stub.
//!
//! Requests are issued as plain unary calls with [`ProstCodec`] against the
//! `etcdserverpb.KV` service paths, so no proto codegen is needed.

use super::{proto, Connection, KvStub};
use crate::core::error::{ClientError, ClientResult};
use std::sync::Arc;
use std::time::Duration;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::Status;

const RANGE_PATH: &str = "/etcdserverpb.KV/Range";
const PUT_PATH: &str = "/etcdserverpb.KV/Put";
const DELETE_RANGE_PATH: &str = "/etcdserverpb.KV/DeleteRange";
const TXN_PATH: &str = "/etcdserverpb.KV/Txn";
const COMPACT_PATH: &str = "/etcdserverpb.KV/Compact";

/// A gRPC channel to one endpoint.
#[derive(Debug, Clone)]
pub struct GrpcConnection {
    endpoint: Arc<str>,
    channel: Channel,
}

impl GrpcConnection {
    fn builder(endpoint: &str, dial_timeout: Duration) -> ClientResult<Endpoint> {
        let builder = Endpoint::from_shared(endpoint.to_string()).map_err(|e| {
            ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(builder.connect_timeout(dial_timeout))
    }

    /// Create a connection that dials on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub fn lazy(endpoint: &str, dial_timeout: Duration) -> ClientResult<Self> {
        let channel = Self::builder(endpoint, dial_timeout)?.connect_lazy();
        Ok(Self {
            endpoint: Arc::from(endpoint),
            channel,
        })
    }

    /// Dial `endpoint`, failing if it does not connect within `dial_timeout`.
    pub async fn connect(endpoint: &str, dial_timeout: Duration) -> ClientResult<Self> {
        let channel = Self::builder(endpoint, dial_timeout)?
            .connect()
            .await
            .map_err(|e| ClientError::transport(format!("dial {}: {}", endpoint, e)))?;
        Ok(Self {
            endpoint: Arc::from(endpoint),
            channel,
        })
    }
}

impl Connection for GrpcConnection {
    type Stub = GrpcKvStub;

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn stub(&self) -> GrpcKvStub {
        GrpcKvStub {
            inner: Grpc::new(self.channel.clone()),
        }
    }
}

/// `etcdserverpb.KV` client over a tonic channel.
#[derive(Debug, Clone)]
pub struct GrpcKvStub {
    inner: Grpc<Channel>,
}

impl GrpcKvStub {
    async fn unary<Req, Resp>(&self, path: &'static str, req: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("service was not ready: {}", e)))?;
        let codec = ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(
                tonic::Request::new(req),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;
        Ok(response.into_inner())
    }
}

impl KvStub for GrpcKvStub {
    async fn range(&self, req: proto::RangeRequest) -> Result<proto::RangeResponse, Status> {
        self.unary(RANGE_PATH, req).await
    }

    async fn put(&self, req: proto::PutRequest) -> Result<proto::PutResponse, Status> {
        self.unary(PUT_PATH, req).await
    }

    async fn delete_range(
        &self,
        req: proto::DeleteRangeRequest,
    ) -> Result<proto::DeleteRangeResponse, Status> {
        self.unary(DELETE_RANGE_PATH, req).await
    }

    async fn txn(&self, req: proto::TxnRequest) -> Result<proto::TxnResponse, Status> {
        self.unary(TXN_PATH, req).await
    }

    async fn compact(
        &self,
        req: proto::CompactionRequest,
    ) -> Result<proto::CompactionResponse, Status> {
        self.unary(COMPACT_PATH, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lazy_connection_keeps_endpoint() {
        let conn = GrpcConnection::lazy("http://127.0.0.1:2379", Duration::from_secs(1)).unwrap();
        assert_eq!(conn.endpoint(), "http://127.0.0.1:2379");
    }

    #[tokio::test]
    async fn malformed_endpoint_is_rejected() {
        let err = GrpcConnection::lazy("http://bad host:2379", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ClientError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn dead_endpoint_classifies_as_transport() {
        let conn = GrpcConnection::lazy("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let status = conn
            .stub()
            .range(proto::RangeRequest {
                key: b"k".to_vec(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        let err = ClientError::from_status(status);
        assert!(err.is_transport(), "got {err:?}");
    }
}
