//! Runs a single lottery round over a locally generated tree.

pub mod config;

use anyhow::Context;
use treelot_lottery::{DrawSource, LotteryFactory};
use treelot_network::{LocalTest, Tree};
use treelot_protocol::{LotteryTicket, PROTOCOL_NAME};

use crate::config::NodeConfig;

/// Build the tree described by `config`, run one round and return the ticket.
pub async fn run_round(config: &NodeConfig) -> anyhow::Result<LotteryTicket> {
    config.validate()?;

    let tree = Tree::generate(config.nodes, config.branching_factor)
        .context("building tree")?;
    tracing::debug!(depth = tree.depth(), "Tree:\n{}", tree.dump());

    let local = LocalTest::new().with_factory(LotteryFactory::new(DrawSource::Random {
        seed: config.seed,
    }));
    let mut round = local
        .start_protocol(PROTOCOL_NAME, &tree)
        .context("starting round")?;

    let ticket = round
        .ticket(config.timeout())
        .await
        .with_context(|| format!("round {} did not produce a ticket", round.round_id()))?;

    let counts = round.message_counts();
    let reports = round.finish().await;
    tracing::info!(
        nodes = reports.len(),
        announces = counts.announces,
        replies = counts.replies,
        "All nodes done"
    );

    Ok(ticket)
}
