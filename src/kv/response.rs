//! Typed KV responses.
//!
//! Each response is an immutable snapshot of the wire reply for one logical
//! operation. They carry accessors only.

use super::op::OpKind;
use crate::core::error::{ClientError, ClientResult};
use crate::remote::proto::{self, response_op};

pub use crate::remote::proto::{KeyValue, ResponseHeader};

/// Reply to any descriptor, one variant per [`OpKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum OpResponse {
    Range(proto::RangeResponse),
    Put(proto::PutResponse),
    DeleteRange(proto::DeleteRangeResponse),
    Txn(proto::TxnResponse),
}

impl OpResponse {
    /// Kind of operation this reply answers.
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Range(_) => OpKind::Range,
            Self::Put(_) => OpKind::Put,
            Self::DeleteRange(_) => OpKind::DeleteRange,
            Self::Txn(_) => OpKind::Txn,
        }
    }

    /// Convert one transaction sub-response. Empty entries yield None.
    pub fn from_response_op(op: proto::ResponseOp) -> Option<Self> {
        op.response.map(|response| match response {
            response_op::Response::ResponseRange(r) => Self::Range(r),
            response_op::Response::ResponsePut(r) => Self::Put(r),
            response_op::Response::ResponseDeleteRange(r) => Self::DeleteRange(r),
            response_op::Response::ResponseTxn(r) => Self::Txn(r),
        })
    }

    /// Unwrap a Range reply.
    pub fn into_get(self) -> ClientResult<GetResponse> {
        match self {
            Self::Range(r) => Ok(GetResponse(r)),
            _ => Err(ClientError::UnexpectedResponse {
                expected: OpKind::Range,
            }),
        }
    }

    /// Unwrap a Put reply.
    pub fn into_put(self) -> ClientResult<PutResponse> {
        match self {
            Self::Put(r) => Ok(PutResponse(r)),
            _ => Err(ClientError::UnexpectedResponse {
                expected: OpKind::Put,
            }),
        }
    }

    /// Unwrap a DeleteRange reply.
    pub fn into_delete(self) -> ClientResult<DeleteResponse> {
        match self {
            Self::DeleteRange(r) => Ok(DeleteResponse(r)),
            _ => Err(ClientError::UnexpectedResponse {
                expected: OpKind::DeleteRange,
            }),
        }
    }

    /// Unwrap a Txn reply.
    pub fn into_txn(self) -> ClientResult<TxnResponse> {
        match self {
            Self::Txn(r) => Ok(TxnResponse(r)),
            _ => Err(ClientError::UnexpectedResponse {
                expected: OpKind::Txn,
            }),
        }
    }
}

fn revision_of(header: &Option<ResponseHeader>) -> i64 {
    header.as_ref().map(|h| h.revision).unwrap_or(0)
}

/// Result of a Get.
#[derive(Debug, Clone, PartialEq)]
pub struct GetResponse(proto::RangeResponse);

impl GetResponse {
    pub fn header(&self) -> Option<&ResponseHeader> {
        self.0.header.as_ref()
    }

    /// Store revision the read was served at.
    pub fn revision(&self) -> i64 {
        revision_of(&self.0.header)
    }

    pub fn kvs(&self) -> &[KeyValue] {
        &self.0.kvs
    }

    /// Whether more keys matched than `limit` allowed.
    pub fn more(&self) -> bool {
        self.0.more
    }

    /// Total number of keys in the requested range.
    pub fn count(&self) -> i64 {
        self.0.count
    }

    pub fn into_inner(self) -> proto::RangeResponse {
        self.0
    }
}

/// Result of a Put.
#[derive(Debug, Clone, PartialEq)]
pub struct PutResponse(proto::PutResponse);

impl PutResponse {
    pub fn header(&self) -> Option<&ResponseHeader> {
        self.0.header.as_ref()
    }

    /// Store revision after the write.
    pub fn revision(&self) -> i64 {
        revision_of(&self.0.header)
    }

    /// Previous key-value, when requested with `with_prev_kv`.
    pub fn prev_kv(&self) -> Option<&KeyValue> {
        self.0.prev_kv.as_ref()
    }

    pub fn into_inner(self) -> proto::PutResponse {
        self.0
    }
}

/// Result of a Delete.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResponse(proto::DeleteRangeResponse);

impl DeleteResponse {
    pub fn header(&self) -> Option<&ResponseHeader> {
        self.0.header.as_ref()
    }

    pub fn revision(&self) -> i64 {
        revision_of(&self.0.header)
    }

    /// Number of keys deleted.
    pub fn deleted(&self) -> i64 {
        self.0.deleted
    }

    pub fn prev_kvs(&self) -> &[KeyValue] {
        &self.0.prev_kvs
    }

    pub fn into_inner(self) -> proto::DeleteRangeResponse {
        self.0
    }
}

/// Result of a Txn.
#[derive(Debug, Clone, PartialEq)]
pub struct TxnResponse(proto::TxnResponse);

impl TxnResponse {
    pub fn header(&self) -> Option<&ResponseHeader> {
        self.0.header.as_ref()
    }

    pub fn revision(&self) -> i64 {
        revision_of(&self.0.header)
    }

    /// Whether every compare held and the success branch ran.
    pub fn succeeded(&self) -> bool {
        self.0.succeeded
    }

    /// Replies of the branch that ran, in op order.
    pub fn responses(&self) -> Vec<OpResponse> {
        self.0
            .responses
            .iter()
            .cloned()
            .filter_map(OpResponse::from_response_op)
            .collect()
    }

    pub fn into_inner(self) -> proto::TxnResponse {
        self.0
    }
}

/// Result of a Compact.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactResponse(proto::CompactionResponse);

impl CompactResponse {
    pub(crate) fn new(inner: proto::CompactionResponse) -> Self {
        Self(inner)
    }

    pub fn header(&self) -> Option<&ResponseHeader> {
        self.0.header.as_ref()
    }

    pub fn revision(&self) -> i64 {
        revision_of(&self.0.header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(revision: i64) -> Option<ResponseHeader> {
        Some(ResponseHeader {
            cluster_id: 1,
            member_id: 2,
            revision,
            raft_term: 3,
        })
    }

    #[test]
    fn unwrap_matches_kind() {
        let reply = OpResponse::Put(proto::PutResponse {
            header: header(9),
            prev_kv: None,
        });
        assert_eq!(reply.kind(), OpKind::Put);
        assert_eq!(reply.clone().into_put().unwrap().revision(), 9);
        assert!(matches!(
            reply.into_get(),
            Err(ClientError::UnexpectedResponse {
                expected: OpKind::Range
            })
        ));
    }

    #[test]
    fn txn_responses_are_typed() {
        let txn = TxnResponse(proto::TxnResponse {
            header: header(4),
            succeeded: true,
            responses: vec![
                proto::ResponseOp {
                    response: Some(response_op::Response::ResponseDeleteRange(
                        proto::DeleteRangeResponse {
                            header: header(4),
                            deleted: 2,
                            prev_kvs: vec![],
                        },
                    )),
                },
                proto::ResponseOp { response: None },
            ],
        });
        assert!(txn.succeeded());
        let responses = txn.responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].clone().into_delete().unwrap().deleted(), 2);
    }

    #[test]
    fn missing_header_reads_as_revision_zero() {
        let get = GetResponse(proto::RangeResponse::default());
        assert_eq!(get.revision(), 0);
        assert!(get.kvs().is_empty());
    }
}
