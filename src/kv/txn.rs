//! Transaction builder.

use super::compare::Compare;
use super::dispatch::Kv;
use super::op::Op;
use super::response::TxnResponse;
use crate::core::context::Context;
use crate::core::error::ClientResult;
use crate::remote::ConnectionPool;

/// If/Then/Else transaction bound to a dispatcher and a context.
///
/// `when` accumulates compares; `then` and `or_else` replace their branch.
/// `commit` consumes the builder, so a transaction is sent at most once.
///
/// ```ignore
/// let resp = kv
///     .txn(&ctx)
///     .when([Compare::version("k", CompareOp::Equal, 0)])
///     .then([Op::put("k", "v", [])])
///     .or_else([Op::get("k", [])])
///     .commit()
///     .await?;
/// ```
#[must_use = "a transaction does nothing until committed"]
pub struct Txn<'a, P: ConnectionPool> {
    kv: &'a Kv<P>,
    ctx: &'a Context,
    compares: Vec<Compare>,
    success: Vec<Op>,
    failure: Vec<Op>,
}

impl<'a, P: ConnectionPool> Txn<'a, P> {
    pub(crate) fn new(kv: &'a Kv<P>, ctx: &'a Context) -> Self {
        Self {
            kv,
            ctx,
            compares: Vec::new(),
            success: Vec::new(),
            failure: Vec::new(),
        }
    }

    /// Add compares. All of them must hold for the success branch to run.
    pub fn when(mut self, compares: impl IntoIterator<Item = Compare>) -> Self {
        self.compares.extend(compares);
        self
    }

    /// Ops to run when every compare holds.
    pub fn then(mut self, ops: impl IntoIterator<Item = Op>) -> Self {
        self.success = ops.into_iter().collect();
        self
    }

    /// Ops to run when any compare fails.
    pub fn or_else(mut self, ops: impl IntoIterator<Item = Op>) -> Self {
        self.failure = ops.into_iter().collect();
        self
    }

    /// Send the transaction.
    ///
    /// Retried on transport failure only when no branch contains a write.
    pub async fn commit(self) -> ClientResult<TxnResponse> {
        let op = Op::txn(self.compares, self.success, self.failure);
        self.kv.execute(self.ctx, &op).await?.into_txn()
    }
}
