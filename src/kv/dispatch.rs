//! KV request dispatcher.
//!
//! [`Kv`] owns the active (connection, stub) pair and runs every logical
//! operation through one retry policy:
//!
//! | Failure        | Read (Range, read-only Txn)   | Write (Put, Delete, Txn)      |
//! |----------------|-------------------------------|-------------------------------|
//! | RPC-level      | return, no rotation           | return, no rotation           |
//! | Cancellation   | return, no rotation           | return, no rotation           |
//! | Transport      | await rotation, retry         | rotate in background, return  |
//! | Rotation       | return                        | logged by the background task |
//!
//! Writes are never retried: a prior attempt may already have been applied,
//! so only the caller can decide whether to resubmit. The read loop has no
//! attempt limit; it ends on success, on a non-transport error, on rotation
//! failure, or when the context fires.
//!
//! # Connection pair
//!
//! The connection and the stub bound to it live together behind one mutex.
//! Readers clone the pair, rotation swaps it whole, and the lock is never
//! held across an RPC or a pool call. Concurrent rotations are not
//! coalesced; whichever installs last wins.

use super::compare::Compare;
use super::op::{Op, OpOption, Request};
use super::response::{
    CompactResponse, DeleteResponse, GetResponse, OpResponse, PutResponse, TxnResponse,
};
use super::txn::Txn;
use crate::core::context::Context;
use crate::core::error::{ClientError, ClientResult};
use crate::ops::observability::{metrics, MetricsRegistry};
use crate::remote::{proto, Connection, ConnectionPool, KvStub};
use parking_lot::Mutex;
use std::sync::Arc;

/// A connection and the stub bound to it.
struct Remote<C: Connection> {
    conn: C,
    stub: Arc<C::Stub>,
}

impl<C: Connection> Clone for Remote<C> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            stub: Arc::clone(&self.stub),
        }
    }
}

impl<C: Connection> Remote<C> {
    fn bind(conn: C) -> Self {
        let stub = Arc::new(conn.stub());
        Self { conn, stub }
    }

    async fn dispatch(&self, request: Request) -> ClientResult<OpResponse> {
        let result = match request {
            Request::Range(r) => self.stub.range(r).await.map(OpResponse::Range),
            Request::Put(r) => self.stub.put(r).await.map(OpResponse::Put),
            Request::DeleteRange(r) => self.stub.delete_range(r).await.map(OpResponse::DeleteRange),
            Request::Txn(r) => self.stub.txn(r).await.map(OpResponse::Txn),
        };
        result.map_err(ClientError::from_status)
    }
}

struct KvInner<P: ConnectionPool> {
    pool: Arc<P>,
    remote: Mutex<Remote<P::Conn>>,
    metrics: Arc<MetricsRegistry>,
}

impl<P: ConnectionPool> KvInner<P> {
    fn remote(&self) -> Remote<P::Conn> {
        self.remote.lock().clone()
    }

    /// Replace the active pair with a connection from the pool.
    async fn switch_remote(&self, failed: &P::Conn, cause: &ClientError) -> ClientResult<()> {
        let conn = match self.pool.retry_connection(failed, cause).await {
            Ok(conn) => conn,
            Err(e) => {
                self.metrics.counter_inc(metrics::KV_ROTATION_FAILURES_TOTAL);
                tracing::warn!(
                    endpoint = %failed.endpoint(),
                    error = %e,
                    "no replacement connection available"
                );
                return Err(e);
            }
        };

        let next = Remote::bind(conn);
        tracing::info!(
            from = %failed.endpoint(),
            to = %next.conn.endpoint(),
            "installed replacement connection"
        );
        *self.remote.lock() = next;
        self.metrics.counter_inc(metrics::KV_ROTATIONS_TOTAL);
        Ok(())
    }

    fn observe_failure(&self, err: &ClientError) {
        if err.is_rpc_error() {
            self.metrics.counter_inc(metrics::KV_RPC_ERRORS_TOTAL);
        } else if err.is_transport() {
            self.metrics.counter_inc(metrics::KV_TRANSPORT_ERRORS_TOTAL);
        }
    }
}

/// KV client with read failover and fail-fast writes.
///
/// Cloning is cheap; clones share the connection pair and metrics.
pub struct Kv<P: ConnectionPool> {
    inner: Arc<KvInner<P>>,
}

impl<P: ConnectionPool> Clone for Kv<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: ConnectionPool> Kv<P> {
    /// Create a dispatcher starting on the pool's active connection.
    pub fn new(pool: Arc<P>) -> Self {
        Self::with_metrics(pool, Arc::new(MetricsRegistry::new()))
    }

    /// Create a dispatcher that records into `metrics`.
    pub fn with_metrics(pool: Arc<P>, metrics: Arc<MetricsRegistry>) -> Self {
        let remote = Remote::bind(pool.active_connection());
        Self {
            inner: Arc::new(KvInner {
                pool,
                remote: Mutex::new(remote),
                metrics,
            }),
        }
    }

    /// The connection currently in use.
    pub fn connection(&self) -> P::Conn {
        self.inner.remote().conn
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.inner.metrics
    }

    /// Put `value` at `key`.
    ///
    /// Never retried: a transport failure is returned while the connection
    /// is replaced in the background.
    pub async fn put(
        &self,
        ctx: &Context,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        opts: impl IntoIterator<Item = OpOption>,
    ) -> ClientResult<PutResponse> {
        self.execute(ctx, &Op::put(key, value, opts))
            .await?
            .into_put()
    }

    /// Get `key`, or a range of keys.
    ///
    /// Transport failures are absorbed by rotating to a new connection and
    /// retrying.
    pub async fn get(
        &self,
        ctx: &Context,
        key: impl Into<Vec<u8>>,
        opts: impl IntoIterator<Item = OpOption>,
    ) -> ClientResult<GetResponse> {
        self.execute(ctx, &Op::get(key, opts)).await?.into_get()
    }

    /// Delete `key`, or a range of keys. Never retried.
    pub async fn delete(
        &self,
        ctx: &Context,
        key: impl Into<Vec<u8>>,
        opts: impl IntoIterator<Item = OpOption>,
    ) -> ClientResult<DeleteResponse> {
        self.execute(ctx, &Op::delete(key, opts))
            .await?
            .into_delete()
    }

    /// Compact history before `revision`. Never retried.
    pub async fn compact(&self, ctx: &Context, revision: i64) -> ClientResult<CompactResponse> {
        let remote = self.inner.remote();
        let req = proto::CompactionRequest {
            revision,
            physical: false,
        };
        let result = ctx
            .run(async {
                self.inner.metrics.counter_inc(metrics::KV_REQUESTS_TOTAL);
                remote.stub.compact(req).await.map_err(ClientError::from_status)
            })
            .await;
        match result {
            Ok(resp) => Ok(CompactResponse::new(resp)),
            Err(err) => {
                self.inner.observe_failure(&err);
                if err.is_transport() {
                    tracing::warn!(
                        endpoint = %remote.conn.endpoint(),
                        error = %err,
                        "compact failed on transport; rotating in background"
                    );
                    self.rotate_in_background(remote.conn, err.clone());
                }
                Err(err)
            }
        }
    }

    /// Start a transaction bound to `ctx`.
    pub fn txn<'a>(&'a self, ctx: &'a Context) -> Txn<'a, P> {
        Txn::new(self, ctx)
    }

    /// Run a transaction in one call.
    pub async fn txn_with(
        &self,
        ctx: &Context,
        compares: Vec<Compare>,
        success: Vec<Op>,
        failure: Vec<Op>,
    ) -> ClientResult<TxnResponse> {
        self.execute(ctx, &Op::txn(compares, success, failure))
            .await?
            .into_txn()
    }

    /// Execute a descriptor under the retry policy.
    pub async fn execute(&self, ctx: &Context, op: &Op) -> ClientResult<OpResponse> {
        let write = op.is_write();
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let remote = self.inner.remote();
            tracing::debug!(
                kind = ?op.kind(),
                endpoint = %remote.conn.endpoint(),
                attempt,
                "dispatching request"
            );

            // Counted only once the attempt is actually polled.
            let attempt_fut = async {
                self.inner.metrics.counter_inc(metrics::KV_REQUESTS_TOTAL);
                remote.dispatch(op.encode()).await
            };
            let err = match ctx.run(attempt_fut).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            self.inner.observe_failure(&err);
            if !err.is_transport() {
                return Err(err);
            }

            if write {
                tracing::warn!(
                    kind = ?op.kind(),
                    endpoint = %remote.conn.endpoint(),
                    error = %err,
                    "write failed on transport; returning without retry"
                );
                self.rotate_in_background(remote.conn, err.clone());
                return Err(err);
            }

            tracing::warn!(
                kind = ?op.kind(),
                endpoint = %remote.conn.endpoint(),
                error = %err,
                attempt,
                "read failed on transport; rotating before retry"
            );
            ctx.run(self.inner.switch_remote(&remote.conn, &err)).await?;
            self.inner.metrics.counter_inc(metrics::KV_READ_RETRIES_TOTAL);
        }
    }

    fn rotate_in_background(&self, failed: P::Conn, cause: ClientError) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            // Failures are logged and counted by switch_remote.
            let _ = inner.switch_remote(&failed, &cause).await;
        });
    }
}
