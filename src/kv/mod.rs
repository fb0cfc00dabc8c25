//! Key-value client surface.
//!
//! - `op`: operation descriptors and their options
//! - `compare`: transaction predicates
//! - `dispatch`: the [`Kv`] dispatcher and its retry policy
//! - `txn`: transaction builder
//! - `response`: typed replies

pub mod compare;
pub mod dispatch;
pub mod op;
pub mod response;
pub mod txn;

pub use compare::{Compare, CompareOp, CompareTarget};
pub use dispatch::Kv;
pub use op::{
    prefix_end, with_count_only, with_from_key, with_keys_only, with_lease, with_limit,
    with_prefix, with_prev_kv, with_range, with_rev, with_serializable, with_sort, LeaseId, Op,
    OpKind, OpOption, SortOption, SortOrder, SortTarget, NO_LEASE,
};
pub use response::{
    CompactResponse, DeleteResponse, GetResponse, KeyValue, OpResponse, PutResponse,
    ResponseHeader, TxnResponse,
};
pub use txn::Txn;
