//! CLI command implementations.

mod config;
mod kv;

pub use config::{run_config, ConfigArgs, ConfigCommand};
pub use kv::{
    run_compact, run_del, run_get, run_put, CompactArgs, DelArgs, GetArgs, PutArgs,
};
