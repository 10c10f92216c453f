//! Tree lottery runner
//!
//! Runs one lottery round over a locally generated tree and prints the
//! winning ticket.
//!
//! # Example
//!
//! ```bash
//! # 13 nodes, binary tree
//! treelot-node
//!
//! # 40 nodes, 4 children per node, reproducible draws
//! treelot-node -n 40 -b 4 --seed 7
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use treelot_node::config::NodeConfig;

#[derive(Parser, Debug)]
#[command(name = "treelot-node")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of nodes in the tree
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Children per internal node
    #[arg(short, long)]
    branching_factor: Option<usize>,

    /// Milliseconds to wait for the ticket
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Seed for reproducible draws
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(nodes) = self.nodes {
            config.nodes = nodes;
        }
        if let Some(k) = self.branching_factor {
            config.branching_factor = k;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = NodeConfig::load_or_default(args.config.as_deref())
        .context("loading configuration")?;
    args.apply(&mut config);
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(
        nodes = config.nodes,
        branching_factor = config.branching_factor,
        timeout_ms = config.timeout_ms,
        seed = ?config.seed,
        "Starting lottery"
    );

    let ticket = treelot_node::run_round(&config).await?;
    println!("Highest found number: {}", ticket.number);
    println!("Highest number owner ID: {}", ticket.owner_id);
    Ok(())
}
