//! KV command implementations.

use crate::client::Client;
use crate::kv::{self, KeyValue, OpOption};
use anyhow::Result;
use clap::Args;

/// Read a key or a range of keys.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Key, or start of the range.
    pub key: String,

    /// End of the range (exclusive).
    #[arg(long, conflicts_with_all = ["prefix", "from_key"])]
    pub range_end: Option<String>,

    /// Read every key with KEY as prefix.
    #[arg(long, conflicts_with = "from_key")]
    pub prefix: bool,

    /// Read every key >= KEY.
    #[arg(long)]
    pub from_key: bool,

    /// Revision to read at (0 = latest).
    #[arg(long, default_value_t = 0)]
    pub rev: i64,

    /// Maximum number of keys (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub limit: i64,

    /// Print keys only.
    #[arg(long)]
    pub keys_only: bool,

    /// Print the number of matching keys only.
    #[arg(long)]
    pub count_only: bool,
}

impl GetArgs {
    fn options(&self) -> Vec<OpOption> {
        let mut opts = Vec::new();
        if let Some(ref end) = self.range_end {
            opts.push(kv::with_range(end.as_bytes()));
        }
        if self.prefix {
            opts.push(kv::with_prefix());
        }
        if self.from_key {
            opts.push(kv::with_from_key());
        }
        if self.rev > 0 {
            opts.push(kv::with_rev(self.rev));
        }
        if self.limit > 0 {
            opts.push(kv::with_limit(self.limit));
        }
        if self.keys_only {
            opts.push(kv::with_keys_only());
        }
        if self.count_only {
            opts.push(kv::with_count_only());
        }
        opts
    }
}

/// Write a key.
#[derive(Args, Debug)]
pub struct PutArgs {
    pub key: String,
    pub value: String,

    /// Lease ID to attach, in hex or decimal.
    #[arg(long)]
    pub lease: Option<String>,

    /// Print the previous value.
    #[arg(long)]
    pub prev_kv: bool,
}

/// Delete a key or a range of keys.
#[derive(Args, Debug)]
pub struct DelArgs {
    pub key: String,

    /// End of the range (exclusive).
    #[arg(long, conflicts_with = "prefix")]
    pub range_end: Option<String>,

    /// Delete every key with KEY as prefix.
    #[arg(long)]
    pub prefix: bool,

    /// Print the deleted pairs.
    #[arg(long)]
    pub prev_kv: bool,
}

impl DelArgs {
    fn options(&self) -> Vec<OpOption> {
        let mut opts = Vec::new();
        if let Some(ref end) = self.range_end {
            opts.push(kv::with_range(end.as_bytes()));
        }
        if self.prefix {
            opts.push(kv::with_prefix());
        }
        if self.prev_kv {
            opts.push(kv::with_prev_kv());
        }
        opts
    }
}

/// Compact history before a revision.
#[derive(Args, Debug)]
pub struct CompactArgs {
    pub revision: i64,
}

fn parse_lease(raw: &str) -> Result<kv::LeaseId> {
    let parsed = match raw.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => raw.parse::<i64>().or_else(|_| i64::from_str_radix(raw, 16)),
    };
    parsed.map_err(|e| anyhow::anyhow!("invalid lease ID {:?}: {}", raw, e))
}

fn print_kv(pair: &KeyValue, keys_only: bool) {
    println!("{}", String::from_utf8_lossy(&pair.key));
    if !keys_only {
        println!("{}", String::from_utf8_lossy(&pair.value));
    }
}

/// Run the get command.
pub async fn run_get(client: &Client, args: GetArgs) -> Result<()> {
    let ctx = client.context();
    let resp = client
        .kv()
        .get(&ctx, args.key.as_bytes(), args.options())
        .await?;

    if args.count_only {
        println!("{}", resp.count());
        return Ok(());
    }
    for pair in resp.kvs() {
        print_kv(pair, args.keys_only);
    }
    tracing::debug!(revision = resp.revision(), more = resp.more(), "get complete");
    Ok(())
}

/// Run the put command.
pub async fn run_put(client: &Client, args: PutArgs) -> Result<()> {
    let mut opts = Vec::new();
    if let Some(ref lease) = args.lease {
        opts.push(kv::with_lease(parse_lease(lease)?));
    }
    if args.prev_kv {
        opts.push(kv::with_prev_kv());
    }

    let ctx = client.context();
    let resp = client
        .kv()
        .put(&ctx, args.key.as_bytes(), args.value.as_bytes(), opts)
        .await?;
    println!("OK");
    if let Some(prev) = resp.prev_kv() {
        print_kv(prev, false);
    }
    Ok(())
}

/// Run the del command.
pub async fn run_del(client: &Client, args: DelArgs) -> Result<()> {
    let ctx = client.context();
    let resp = client
        .kv()
        .delete(&ctx, args.key.as_bytes(), args.options())
        .await?;
    println!("{}", resp.deleted());
    for prev in resp.prev_kvs() {
        print_kv(prev, false);
    }
    Ok(())
}

/// Run the compact command.
pub async fn run_compact(client: &Client, args: CompactArgs) -> Result<()> {
    let ctx = client.context();
    client.kv().compact(&ctx, args.revision).await?;
    println!("compacted revision {}", args.revision);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{prefix_end, Op};

    fn get_args(key: &str) -> GetArgs {
        GetArgs {
            key: key.to_string(),
            range_end: None,
            prefix: false,
            from_key: false,
            rev: 0,
            limit: 0,
            keys_only: false,
            count_only: false,
        }
    }

    #[test]
    fn get_prefix_sets_range_end() {
        let mut args = get_args("app/");
        args.prefix = true;
        args.rev = 7;
        let op = Op::get(args.key.as_bytes(), args.options());
        assert_eq!(op.range_end(), prefix_end(b"app/").as_slice());
        assert_eq!(op.revision(), 7);
        assert_eq!(op.limit(), 0);
    }

    #[test]
    fn del_range_end_is_passed_through() {
        let args = DelArgs {
            key: "a".to_string(),
            range_end: Some("z".to_string()),
            prefix: false,
            prev_kv: false,
        };
        let op = Op::delete(args.key.as_bytes(), args.options());
        assert_eq!(op.range_end(), b"z");
    }

    #[test]
    fn lease_accepts_hex_and_decimal() {
        assert_eq!(parse_lease("0x10").unwrap(), 16);
        assert_eq!(parse_lease("42").unwrap(), 42);
        assert_eq!(parse_lease("7fe").unwrap(), 0x7fe);
        assert!(parse_lease("lease").is_err());
    }
}
