//! Error types and gRPC status classification.
//!
//! Every failure surfaced by the KV client falls into one of three classes
//! that drive the dispatcher's retry policy:
//!
//! - **RPC-level**: the remote processed the request and rejected it. Never
//!   retried and never a reason to rotate the connection.
//! - **Transport**: the request could not be delivered or answered. Reads
//!   rotate and retry; writes rotate in the background and surface the error.
//! - **Cancellation**: the caller's context was cancelled or its deadline
//!   passed. Terminal, never a retry trigger.
//!
//! Rotation failures (no replacement connection) are terminal as well.

use crate::kv::op::OpKind;
use std::error::Error as _;
use thiserror::Error;
use tonic::{Code, Status};

/// Errors returned by the KV client.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The remote store explicitly rejected the request.
    #[error("rpc error ({code:?}): {message}")]
    Rpc { code: Code, message: String },

    /// The request could not reach the remote or get an answer from it.
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// The connection pool could not produce a replacement connection.
    #[error("connection rotation failed: {message}")]
    Rotation { message: String },

    /// The caller's context was cancelled.
    #[error("context canceled")]
    Cancelled,

    /// The caller's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// An endpoint could not be parsed into a URI.
    #[error("invalid endpoint {endpoint:?}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// The reply variant did not match the operation that was sent.
    #[error("unexpected response for {expected:?} operation")]
    UnexpectedResponse { expected: OpKind },
}

impl ClientError {
    /// Create a Transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a Rotation error.
    pub fn rotation(message: impl Into<String>) -> Self {
        Self::Rotation {
            message: message.into(),
        }
    }

    /// Classify a gRPC status returned by a stub.
    ///
    /// `Unavailable` is always a transport failure. `Unknown` counts as one
    /// only when tonic attached an underlying transport error as its source;
    /// a bare `Unknown` came from the server and is RPC-level.
    pub fn from_status(status: Status) -> Self {
        match status.code() {
            Code::Cancelled => Self::Cancelled,
            Code::DeadlineExceeded => Self::DeadlineExceeded,
            Code::Unavailable => Self::transport(status.message()),
            Code::Unknown if status.source().is_some() => Self::transport(status.message()),
            code => Self::Rpc {
                code,
                message: status.message().to_string(),
            },
        }
    }

    /// Check if the remote processed and rejected the request.
    pub fn is_rpc_error(&self) -> bool {
        matches!(self, Self::Rpc { .. })
    }

    /// Check if this error is a transport failure eligible for rotation.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Check if this error came from the caller's context.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// gRPC code for RPC-level errors.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<Status> for ClientError {
    fn from(status: Status) -> Self {
        Self::from_status(status)
    }
}

/// Result type using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
