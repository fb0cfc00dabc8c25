//! Operation descriptors.
//!
//! An [`Op`] is an immutable description of one logical request. It is built
//! by a factory (`Op::get`, `Op::put`, `Op::delete`, `Op::txn`) plus any
//! number of [`OpOption`]s. Options are applied in call order and each one
//! only touches the fields it owns, so when two options conflict the last
//! one wins. Nothing is validated here; the server rejects nonsense.

use super::compare::Compare;
use crate::remote::proto::{self, request_op};

pub use crate::remote::proto::{SortOrder, SortTarget};

/// Lease identifier attached to a Put. `0` means no lease.
pub type LeaseId = i64;

/// Lease value meaning "no lease attached".
pub const NO_LEASE: LeaseId = 0;

/// Range end meaning "no upper bound".
pub const NO_UPPER_BOUND: &[u8] = &[0];

/// Kind of logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Range,
    Put,
    DeleteRange,
    Txn,
}

/// Sort specification for range reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOption {
    pub order: SortOrder,
    pub target: SortTarget,
}

/// A single option applied to an [`Op`] at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpOption {
    /// Operate on `[key, end)`.
    RangeEnd(Vec<u8>),
    /// Operate on every key sharing the op key as prefix.
    Prefix,
    /// Operate on every key `>= key`.
    FromKey,
    /// Read as of this revision.
    Revision(i64),
    /// Bound the number of returned keys.
    Limit(i64),
    /// Sort returned keys.
    Sort(SortOption),
    /// Attach a lease to a Put.
    Lease(LeaseId),
    /// Return the previous key-value(s) of a Put or Delete.
    PrevKv,
    /// Return keys without values.
    KeysOnly,
    /// Return only the count of matching keys.
    CountOnly,
    /// Serve the read from the local member without a quorum round.
    Serializable,
}

/// Operate on the range `[key, end)`.
pub fn with_range(end: impl Into<Vec<u8>>) -> OpOption {
    OpOption::RangeEnd(end.into())
}

/// Operate on all keys with the op key as prefix.
pub fn with_prefix() -> OpOption {
    OpOption::Prefix
}

/// Operate on all keys greater than or equal to the op key.
pub fn with_from_key() -> OpOption {
    OpOption::FromKey
}

/// Read at revision `rev` (0 = current).
pub fn with_rev(rev: i64) -> OpOption {
    OpOption::Revision(rev)
}

/// Return at most `limit` keys (<= 0 = unbounded).
pub fn with_limit(limit: i64) -> OpOption {
    OpOption::Limit(limit)
}

/// Sort the result by `target` in `order`.
pub fn with_sort(order: SortOrder, target: SortTarget) -> OpOption {
    OpOption::Sort(SortOption { order, target })
}

/// Attach lease `id` to a Put.
pub fn with_lease(id: LeaseId) -> OpOption {
    OpOption::Lease(id)
}

/// Return previous key-values from a Put or Delete.
pub fn with_prev_kv() -> OpOption {
    OpOption::PrevKv
}

/// Return only keys from a Get.
pub fn with_keys_only() -> OpOption {
    OpOption::KeysOnly
}

/// Return only the key count from a Get.
pub fn with_count_only() -> OpOption {
    OpOption::CountOnly
}

/// Allow a Get to be served without linearizable guarantees.
pub fn with_serializable() -> OpOption {
    OpOption::Serializable
}

/// Smallest key greater than every key starting with `prefix`.
///
/// An empty or all-`0xff` prefix has no such key and maps to
/// [`NO_UPPER_BOUND`].
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return end;
        }
    }
    NO_UPPER_BOUND.to_vec()
}

impl OpOption {
    fn apply(self, op: &mut Op) {
        match self {
            Self::RangeEnd(end) => op.range_end = end,
            Self::Prefix => op.range_end = prefix_end(&op.key),
            Self::FromKey => op.range_end = NO_UPPER_BOUND.to_vec(),
            Self::Revision(rev) => op.revision = rev,
            Self::Limit(limit) => op.limit = limit,
            Self::Sort(sort) => op.sort = Some(sort),
            Self::Lease(id) => op.lease = id,
            Self::PrevKv => op.prev_kv = true,
            Self::KeysOnly => op.keys_only = true,
            Self::CountOnly => op.count_only = true,
            Self::Serializable => op.serializable = true,
        }
    }
}

/// Immutable description of one logical request.
///
/// `kind` decides which fields mean anything; the rest are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Op {
    kind: OpKind,
    key: Vec<u8>,
    range_end: Vec<u8>,
    value: Vec<u8>,
    revision: i64,
    limit: i64,
    sort: Option<SortOption>,
    lease: LeaseId,
    prev_kv: bool,
    keys_only: bool,
    count_only: bool,
    serializable: bool,
    compares: Vec<Compare>,
    success: Vec<Op>,
    failure: Vec<Op>,
}

/// Wire request for one descriptor, one variant per [`OpKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Range(proto::RangeRequest),
    Put(proto::PutRequest),
    DeleteRange(proto::DeleteRangeRequest),
    Txn(proto::TxnRequest),
}

impl Op {
    fn new(kind: OpKind, key: Vec<u8>) -> Self {
        Self {
            kind,
            key,
            range_end: Vec::new(),
            value: Vec::new(),
            revision: 0,
            limit: 0,
            sort: None,
            lease: NO_LEASE,
            prev_kv: false,
            keys_only: false,
            count_only: false,
            serializable: false,
            compares: Vec::new(),
            success: Vec::new(),
            failure: Vec::new(),
        }
    }

    fn with_options(mut self, opts: impl IntoIterator<Item = OpOption>) -> Self {
        for opt in opts {
            opt.apply(&mut self);
        }
        self
    }

    /// Range read of `key`.
    pub fn get(key: impl Into<Vec<u8>>, opts: impl IntoIterator<Item = OpOption>) -> Self {
        Self::new(OpKind::Range, key.into()).with_options(opts)
    }

    /// Write `value` at `key`.
    pub fn put(
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        opts: impl IntoIterator<Item = OpOption>,
    ) -> Self {
        let mut op = Self::new(OpKind::Put, key.into());
        op.value = value.into();
        op.with_options(opts)
    }

    /// Delete `key`, or a range of keys with [`with_range`] / [`with_prefix`].
    pub fn delete(key: impl Into<Vec<u8>>, opts: impl IntoIterator<Item = OpOption>) -> Self {
        Self::new(OpKind::DeleteRange, key.into()).with_options(opts)
    }

    /// Transaction: run `success` if every compare holds, else `failure`.
    pub fn txn(compares: Vec<Compare>, success: Vec<Op>, failure: Vec<Op>) -> Self {
        let mut op = Self::new(OpKind::Txn, Vec::new());
        op.compares = compares;
        op.success = success;
        op.failure = failure;
        op
    }

    pub fn kind(&self) -> OpKind {
        self.kind
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn range_end(&self) -> &[u8] {
        &self.range_end
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn sort(&self) -> Option<SortOption> {
        self.sort
    }

    pub fn lease(&self) -> LeaseId {
        self.lease
    }

    pub fn compares(&self) -> &[Compare] {
        &self.compares
    }

    pub fn success(&self) -> &[Op] {
        &self.success
    }

    pub fn failure(&self) -> &[Op] {
        &self.failure
    }

    /// Whether submitting this op may change server state.
    ///
    /// A transaction is a write when any op in either branch is.
    pub fn is_write(&self) -> bool {
        match self.kind {
            OpKind::Range => false,
            OpKind::Put | OpKind::DeleteRange => true,
            OpKind::Txn => self
                .success
                .iter()
                .chain(self.failure.iter())
                .any(Op::is_write),
        }
    }

    /// Encode into the wire request for this op's kind.
    pub fn encode(&self) -> Request {
        match self.kind {
            OpKind::Range => Request::Range(self.range_request()),
            OpKind::Put => Request::Put(self.put_request()),
            OpKind::DeleteRange => Request::DeleteRange(self.delete_request()),
            OpKind::Txn => Request::Txn(self.txn_request()),
        }
    }

    fn range_request(&self) -> proto::RangeRequest {
        let mut req = proto::RangeRequest {
            key: self.key.clone(),
            range_end: self.range_end.clone(),
            limit: self.limit,
            revision: self.revision,
            serializable: self.serializable,
            keys_only: self.keys_only,
            count_only: self.count_only,
            ..Default::default()
        };
        if let Some(sort) = self.sort {
            req.sort_order = sort.order as i32;
            req.sort_target = sort.target as i32;
        }
        req
    }

    fn put_request(&self) -> proto::PutRequest {
        proto::PutRequest {
            key: self.key.clone(),
            value: self.value.clone(),
            lease: self.lease,
            prev_kv: self.prev_kv,
        }
    }

    fn delete_request(&self) -> proto::DeleteRangeRequest {
        proto::DeleteRangeRequest {
            key: self.key.clone(),
            range_end: self.range_end.clone(),
            prev_kv: self.prev_kv,
        }
    }

    fn txn_request(&self) -> proto::TxnRequest {
        proto::TxnRequest {
            compare: self.compares.iter().map(Compare::to_proto).collect(),
            success: self.success.iter().map(Op::request_op).collect(),
            failure: self.failure.iter().map(Op::request_op).collect(),
        }
    }

    fn request_op(&self) -> proto::RequestOp {
        let request = match self.encode() {
            Request::Range(r) => request_op::Request::RequestRange(r),
            Request::Put(r) => request_op::Request::RequestPut(r),
            Request::DeleteRange(r) => request_op::Request::RequestDeleteRange(r),
            Request::Txn(r) => request_op::Request::RequestTxn(r),
        };
        proto::RequestOp {
            request: Some(request),
        }
    }
}
