//! Operations and observability.
//!
//! - [`observability`] - Client metrics registry

pub mod observability;
