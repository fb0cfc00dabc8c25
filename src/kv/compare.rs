//! Transaction comparison predicates.
//!
//! A [`Compare`] checks one field of a key (or key range) against a target
//! value. A transaction takes its success branch only when every compare
//! holds.

use crate::remote::proto::{self, compare as pb};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Greater,
    Less,
}

/// Field being compared and the value it is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareTarget {
    /// Number of modifications of the key.
    Version(i64),
    /// Revision at which the key was created.
    CreateRevision(i64),
    /// Revision of the last modification.
    ModRevision(i64),
    /// Stored value.
    Value(Vec<u8>),
    /// Attached lease ID.
    Lease(i64),
}

/// Compare predicate for transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compare {
    key: Vec<u8>,
    range_end: Vec<u8>,
    op: CompareOp,
    target: CompareTarget,
}

impl Compare {
    /// Compare `key`'s `target` field using `op`.
    pub fn new(key: impl Into<Vec<u8>>, op: CompareOp, target: CompareTarget) -> Self {
        Self {
            key: key.into(),
            range_end: Vec::new(),
            op,
            target,
        }
    }

    /// Compare the stored value.
    pub fn value(key: impl Into<Vec<u8>>, op: CompareOp, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, op, CompareTarget::Value(value.into()))
    }

    /// Compare the version. A missing key has version 0.
    pub fn version(key: impl Into<Vec<u8>>, op: CompareOp, version: i64) -> Self {
        Self::new(key, op, CompareTarget::Version(version))
    }

    /// Compare the create revision. A missing key has create revision 0.
    pub fn create_revision(key: impl Into<Vec<u8>>, op: CompareOp, revision: i64) -> Self {
        Self::new(key, op, CompareTarget::CreateRevision(revision))
    }

    /// Compare the last modification revision.
    pub fn mod_revision(key: impl Into<Vec<u8>>, op: CompareOp, revision: i64) -> Self {
        Self::new(key, op, CompareTarget::ModRevision(revision))
    }

    /// Compare the attached lease.
    pub fn lease(key: impl Into<Vec<u8>>, op: CompareOp, lease: i64) -> Self {
        Self::new(key, op, CompareTarget::Lease(lease))
    }

    /// Apply the comparison to every key in `[key, end)`.
    pub fn with_range(mut self, end: impl Into<Vec<u8>>) -> Self {
        self.range_end = end.into();
        self
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn target(&self) -> &CompareTarget {
        &self.target
    }

    pub(crate) fn to_proto(&self) -> proto::Compare {
        let result = match self.op {
            CompareOp::Equal => pb::CompareResult::Equal,
            CompareOp::NotEqual => pb::CompareResult::NotEqual,
            CompareOp::Greater => pb::CompareResult::Greater,
            CompareOp::Less => pb::CompareResult::Less,
        };
        let (target, union) = match &self.target {
            CompareTarget::Version(v) => (pb::CompareTarget::Version, pb::TargetUnion::Version(*v)),
            CompareTarget::CreateRevision(r) => (
                pb::CompareTarget::Create,
                pb::TargetUnion::CreateRevision(*r),
            ),
            CompareTarget::ModRevision(r) => {
                (pb::CompareTarget::Mod, pb::TargetUnion::ModRevision(*r))
            }
            CompareTarget::Value(v) => (pb::CompareTarget::Value, pb::TargetUnion::Value(v.clone())),
            CompareTarget::Lease(l) => (pb::CompareTarget::Lease, pb::TargetUnion::Lease(*l)),
        };
        proto::Compare {
            result: result as i32,
            target: target as i32,
            key: self.key.clone(),
            target_union: Some(union),
            range_end: self.range_end.clone(),
        }
    }
}
