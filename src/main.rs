//! Lattice KV - command-line client.
//!
//! Usage:
//!   lattice-kv [--endpoints URL,URL] get KEY [--prefix|--range-end END|--from-key]
//!   lattice-kv put KEY VALUE [--lease ID]
//!   lattice-kv del KEY [--prefix|--range-end END]
//!   lattice-kv compact REVISION
//!   lattice-kv --config client.toml config validate
//!   lattice-kv --metrics get KEY

use anyhow::Result;
use clap::Parser;
use lattice_client::cli::commands::{run_compact, run_config, run_del, run_get, run_put};
use lattice_client::cli::{init_tracing, Cli, Commands};
use lattice_client::Client;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config validate` must see invalid values to report them.
    let config = match cli.command {
        Commands::Config(_) => cli.load_config_unvalidated()?,
        _ => cli.load_config()?,
    };

    let client = match cli.command {
        Commands::Config(args) => return run_config(&config, args),
        _ => {
            init_tracing(&config.telemetry.log_level);
            Client::new(config)?
        }
    };

    let result = match cli.command {
        Commands::Get(args) => run_get(&client, args).await,
        Commands::Put(args) => run_put(&client, args).await,
        Commands::Del(args) => run_del(&client, args).await,
        Commands::Compact(args) => run_compact(&client, args).await,
        Commands::Config(args) => run_config(client.config(), args),
    };

    if cli.metrics {
        eprint!("{}", client.export_metrics());
    }
    result
}
