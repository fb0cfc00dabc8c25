//! Core client infrastructure.
//!
//! This module contains the pieces every KV call depends on:
//! - [`config`] - Configuration parsing and validation
//! - [`context`] - Request cancellation and deadlines
//! - [`error`] - Error taxonomy and gRPC status classification

pub mod config;
pub mod context;
pub mod error;
