//! Common test utilities.
//!
//! A scripted in-memory cluster that stands in for the remote store and the
//! endpoint pool. Import with `mod common;` in test files.

#![allow(dead_code)]

use lattice_client::core::error::{ClientError, ClientResult};
use lattice_client::kv::Kv;
use lattice_client::remote::{proto, Connection, ConnectionPool, KvStub};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tonic::{Code, Status};

/// Revision reported in every successful reply header.
pub const REVISION: i64 = 10;

/// How a connection answers every call made on it.
#[derive(Debug, Clone)]
pub enum Behavior {
    Healthy,
    /// Fail with `Unavailable`, as tonic does when the channel is broken.
    Unavailable,
    /// Reject with a server status.
    Reject(Code, &'static str),
    /// Never answer.
    Hang,
}

/// A wire request as the remote received it.
#[derive(Debug, Clone, PartialEq)]
pub enum Rpc {
    Range(proto::RangeRequest),
    Put(proto::PutRequest),
    DeleteRange(proto::DeleteRangeRequest),
    Txn(proto::TxnRequest),
    Compact(proto::CompactionRequest),
}

/// One recorded call and the connection it arrived on.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub conn: u64,
    pub rpc: Rpc,
}

#[derive(Default)]
struct ClusterState {
    behaviors: HashMap<u64, Behavior>,
    default_behavior: Option<Behavior>,
    calls: Vec<Call>,
    next_id: u64,
    rotations: Vec<(u64, u64)>,
    fail_rotation: bool,
    failed_rotations: usize,
}

/// Scripted cluster shared by the mock pool, connections and stubs.
///
/// Connection 0 is the initial connection; each rotation hands out the
/// next id. Unscripted connections are healthy.
pub struct Cluster {
    state: Mutex<ClusterState>,
    rotation_open: AtomicBool,
    rotation_gate: Notify,
}

impl Cluster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ClusterState::default()),
            rotation_open: AtomicBool::new(true),
            rotation_gate: Notify::new(),
        })
    }

    /// Script how connection `id` answers.
    pub fn set_behavior(&self, id: u64, behavior: Behavior) {
        self.state.lock().behaviors.insert(id, behavior);
    }

    /// Script how unscripted connections answer.
    pub fn set_default_behavior(&self, behavior: Behavior) {
        self.state.lock().default_behavior = Some(behavior);
    }

    /// Make every rotation fail.
    pub fn fail_rotation(&self) {
        self.state.lock().fail_rotation = true;
    }

    /// Block rotations until [`Cluster::release_rotation`].
    pub fn hold_rotation(&self) {
        self.rotation_open.store(false, Ordering::SeqCst);
    }

    pub fn release_rotation(&self) {
        self.rotation_open.store(true, Ordering::SeqCst);
        self.rotation_gate.notify_waiters();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// (failed, replacement) connection ids, in order.
    pub fn rotations(&self) -> Vec<(u64, u64)> {
        self.state.lock().rotations.clone()
    }

    pub fn failed_rotations(&self) -> usize {
        self.state.lock().failed_rotations
    }

    fn record(&self, conn: u64, rpc: Rpc) -> Behavior {
        let mut state = self.state.lock();
        state.calls.push(Call { conn, rpc });
        state
            .behaviors
            .get(&conn)
            .or(state.default_behavior.as_ref())
            .cloned()
            .unwrap_or(Behavior::Healthy)
    }

    async fn wait_for_rotation_gate(&self) {
        loop {
            let notified = self.rotation_gate.notified();
            if self.rotation_open.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    fn rotate(self: &Arc<Self>, failed: u64) -> ClientResult<MockConn> {
        let mut state = self.state.lock();
        if state.fail_rotation {
            state.failed_rotations += 1;
            return Err(ClientError::rotation("all 3 endpoints unreachable"));
        }
        state.next_id += 1;
        let id = state.next_id;
        state.rotations.push((failed, id));
        Ok(MockConn::new(id, Arc::clone(self)))
    }
}

/// Mock connection identified by a numeric id.
#[derive(Clone)]
pub struct MockConn {
    pub id: u64,
    endpoint: String,
    cluster: Arc<Cluster>,
}

impl MockConn {
    fn new(id: u64, cluster: Arc<Cluster>) -> Self {
        Self {
            id,
            endpoint: format!("http://member-{}:2379", id),
            cluster,
        }
    }
}

impl Connection for MockConn {
    type Stub = MockStub;

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn stub(&self) -> MockStub {
        MockStub {
            id: self.id,
            cluster: Arc::clone(&self.cluster),
        }
    }
}

/// Mock stub that records every call and answers per its connection's script.
pub struct MockStub {
    id: u64,
    cluster: Arc<Cluster>,
}

impl MockStub {
    fn header(&self) -> Option<proto::ResponseHeader> {
        Some(proto::ResponseHeader {
            cluster_id: 1,
            member_id: self.id,
            revision: REVISION,
            raft_term: 2,
        })
    }

    async fn answer<T>(&self, rpc: Rpc, reply: T) -> Result<T, Status> {
        match self.cluster.record(self.id, rpc) {
            Behavior::Healthy => Ok(reply),
            Behavior::Unavailable => Err(Status::unavailable("connection refused")),
            Behavior::Reject(code, message) => Err(Status::new(code, message)),
            Behavior::Hang => std::future::pending().await,
        }
    }
}

impl KvStub for MockStub {
    async fn range(&self, req: proto::RangeRequest) -> Result<proto::RangeResponse, Status> {
        let reply = proto::RangeResponse {
            header: self.header(),
            kvs: vec![proto::KeyValue {
                key: req.key.clone(),
                create_revision: 3,
                mod_revision: REVISION,
                version: 1,
                value: format!("from-{}", self.id).into_bytes(),
                lease: 0,
            }],
            more: false,
            count: 1,
        };
        self.answer(Rpc::Range(req), reply).await
    }

    async fn put(&self, req: proto::PutRequest) -> Result<proto::PutResponse, Status> {
        let reply = proto::PutResponse {
            header: self.header(),
            prev_kv: None,
        };
        self.answer(Rpc::Put(req), reply).await
    }

    async fn delete_range(
        &self,
        req: proto::DeleteRangeRequest,
    ) -> Result<proto::DeleteRangeResponse, Status> {
        let reply = proto::DeleteRangeResponse {
            header: self.header(),
            deleted: 1,
            prev_kvs: Vec::new(),
        };
        self.answer(Rpc::DeleteRange(req), reply).await
    }

    async fn txn(&self, req: proto::TxnRequest) -> Result<proto::TxnResponse, Status> {
        let reply = proto::TxnResponse {
            header: self.header(),
            succeeded: true,
            responses: Vec::new(),
        };
        self.answer(Rpc::Txn(req), reply).await
    }

    async fn compact(
        &self,
        req: proto::CompactionRequest,
    ) -> Result<proto::CompactionResponse, Status> {
        let reply = proto::CompactionResponse {
            header: self.header(),
        };
        self.answer(Rpc::Compact(req), reply).await
    }
}

/// Mock pool over a scripted cluster.
pub struct MockPool {
    cluster: Arc<Cluster>,
}

impl ConnectionPool for MockPool {
    type Conn = MockConn;

    fn active_connection(&self) -> MockConn {
        MockConn::new(0, Arc::clone(&self.cluster))
    }

    async fn retry_connection(
        &self,
        failed: &MockConn,
        _cause: &ClientError,
    ) -> ClientResult<MockConn> {
        self.cluster.wait_for_rotation_gate().await;
        self.cluster.rotate(failed.id)
    }
}

/// Dispatcher wired to `cluster`, starting on connection 0.
pub fn kv(cluster: &Arc<Cluster>) -> Kv<MockPool> {
    Kv::new(Arc::new(MockPool {
        cluster: Arc::clone(cluster),
    }))
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
