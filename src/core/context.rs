//! Request context: cancellation and deadline.
//!
//! Every KV call takes a [`Context`]. The context bounds the RPC attempt and,
//! on the read path, the wait for a replacement connection. When it fires the
//! call fails with [`ClientError::Cancelled`] or
//! [`ClientError::DeadlineExceeded`], never with a transport error.

use crate::core::error::{ClientError, ClientResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation and deadline carried by a request.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

/// Handle that cancels the context returned alongside it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Cancel the associated context and all contexts derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a context that expires after `timeout`.
    ///
    /// The earlier of the parent deadline and the new one applies.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Derive a cancellable context.
    ///
    /// Cancelling the parent also cancels the child.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let token = self.token.child_token();
        let handle = CancelHandle {
            token: token.clone(),
        };
        (
            Self {
                token,
                deadline: self.deadline,
            },
            handle,
        )
    }

    /// Deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The error this context has already produced, if it is done.
    pub fn err(&self) -> Option<ClientError> {
        if self.token.is_cancelled() {
            return Some(ClientError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ClientError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ClientError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => ClientError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ClientError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ClientError::Cancelled
            }
        }
    }

    /// Run `fut` bounded by this context.
    ///
    /// Returns the context error without polling `fut` if the context is
    /// already done.
    pub async fn run<T, F>(&self, fut: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_to_completion() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        let value = ctx.run(async { Ok::<_, ClientError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_future() {
        let (ctx, cancel) = Context::background().with_cancel();
        let task = tokio::spawn(async move {
            ctx.run(std::future::pending::<ClientResult<()>>()).await
        });
        cancel.cancel();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn parent_cancel_reaches_child() {
        let (parent, cancel) = Context::background().with_cancel();
        let child = parent.with_timeout(Duration::from_secs(60));
        cancel.cancel();
        assert!(matches!(child.err(), Some(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn deadline_expires() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let result = ctx.run(std::future::pending::<ClientResult<()>>()).await;
        assert!(matches!(result, Err(ClientError::DeadlineExceeded)));
        assert!(matches!(ctx.err(), Some(ClientError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn child_keeps_earlier_parent_deadline() {
        let parent = Context::background().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
