//! Remote collaborators of the KV dispatcher.
//!
//! The dispatcher only needs three narrow seams:
//!
//! ```text
//! ┌──────────────────┐  retry_connection   ┌──────────────────┐
//! │  ConnectionPool  │ ──────────────────► │    Connection    │
//! │  (endpoint pool) │                     │ (tonic Channel)  │
//! └──────────────────┘                     └──────────────────┘
//!                                                   │ stub()
//!                                                   ▼
//!                                          ┌──────────────────┐
//!                                          │      KvStub      │
//!                                          │ Range/Put/Delete │
//!                                          │  Txn/Compact     │
//!                                          └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`proto`] - etcd v3 KV wire messages
//! - [`grpc`] - tonic-backed connection and stub
//! - [`pool`] - endpoint pool that dials replacement connections

pub mod grpc;
pub mod pool;
pub mod proto;

use crate::core::error::{ClientError, ClientResult};
use std::future::Future;
use tonic::Status;

pub use grpc::{GrpcConnection, GrpcKvStub};
pub use pool::EndpointPool;

/// RPC client bound to one connection.
///
/// Errors are raw gRPC statuses; the dispatcher classifies them.
pub trait KvStub: Send + Sync + 'static {
    /// Range (Get) call.
    fn range(
        &self,
        req: proto::RangeRequest,
    ) -> impl Future<Output = Result<proto::RangeResponse, Status>> + Send;

    /// Put call.
    fn put(
        &self,
        req: proto::PutRequest,
    ) -> impl Future<Output = Result<proto::PutResponse, Status>> + Send;

    /// DeleteRange call.
    fn delete_range(
        &self,
        req: proto::DeleteRangeRequest,
    ) -> impl Future<Output = Result<proto::DeleteRangeResponse, Status>> + Send;

    /// Multi-op transaction call.
    fn txn(
        &self,
        req: proto::TxnRequest,
    ) -> impl Future<Output = Result<proto::TxnResponse, Status>> + Send;

    /// History compaction call.
    fn compact(
        &self,
        req: proto::CompactionRequest,
    ) -> impl Future<Output = Result<proto::CompactionResponse, Status>> + Send;
}

/// A transport connection that can produce stubs bound to itself.
pub trait Connection: Clone + Send + Sync + 'static {
    /// Stub type bound to this connection.
    type Stub: KvStub;

    /// Endpoint this connection talks to, for logging.
    fn endpoint(&self) -> &str;

    /// Create a stub bound to this connection.
    fn stub(&self) -> Self::Stub;
}

/// Source of connections.
pub trait ConnectionPool: Send + Sync + 'static {
    /// Connection type handed out by this pool.
    type Conn: Connection;

    /// The connection to use before any failure has been observed.
    fn active_connection(&self) -> Self::Conn;

    /// Produce a replacement for `failed`, which broke with `cause`.
    ///
    /// May block or time out per the pool's own policy.
    fn retry_connection(
        &self,
        failed: &Self::Conn,
        cause: &ClientError,
    ) -> impl Future<Output = ClientResult<Self::Conn>> + Send;
}
