//! Lattice client - fault-tolerant key-value request dispatch.
//!
//! The client speaks the etcd v3 KV protocol to a cluster of replicas. Every
//! logical operation (Range, Put, DeleteRange, Txn, Compact) goes through a
//! single dispatcher that owns the active connection and decides, per
//! failure, whether to retry on a different replica or surface the error.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Caller / CLI                            │
//! │          put │ get │ delete │ compact │ txn │ execute           │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        KV Dispatcher                            │
//! │   descriptor encode │ retry policy │ (connection, stub) pair    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Remote Transport                           │
//! │        gRPC stub │ endpoint pool │ connection rotation          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Configuration parsing and validation
//! - [`core::context`] - Cancellation and deadlines
//! - [`core::error`] - Error types and failure classification
//!
//! ## KV
//! - [`kv::op`] - Operation descriptors and options
//! - [`kv::compare`] - Transaction predicates
//! - [`kv::dispatch`] - Dispatcher and retry policy
//! - [`kv::txn`] - Transaction builder
//! - [`kv::response`] - Typed replies
//!
//! ## Remote
//! - [`remote::proto`] - etcd v3 KV wire messages
//! - [`remote::grpc`] - tonic connection and stub
//! - [`remote::pool`] - Endpoint pool and rotation order
//!
//! ## Operations
//! - [`ops::observability`] - Client metrics
//!
//! ## CLI
//! - [`cli::commands`] - CLI command implementations
//!
//! # Key Invariants
//!
//! - Writes are attempted at most once per call; a transport failure is
//!   returned to the caller while the connection is replaced in the background.
//! - Reads retry on transport failure after rotating to a new connection.
//! - RPC-level and cancellation errors are never retried.
//! - The connection and its stub are always read and replaced together.

// Core infrastructure
pub mod core;

// KV surface and dispatcher
pub mod kv;

// Transport and connection management
pub mod remote;

// Operations and observability
pub mod ops;

// Client facade
pub mod client;

// CLI
pub mod cli;

// Re-exports for convenience
pub use self::core::{config, context, error};
pub use client::Client;
pub use kv::{Compare, CompareOp, Kv, Op, OpResponse, Txn};
pub use ops::observability;
