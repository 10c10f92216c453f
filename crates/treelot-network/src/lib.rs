//! In-process collaborators for lottery rounds.
//!
//! - [`tree`]: builds rooted spanning trees over a roster of node ids
//! - [`codec`]: JSON wire encoding of protocol messages
//! - [`router`]: per-node mailboxes, reply batching and node drivers
//! - [`local`]: wires a tree, a factory and the router into one round

pub mod codec;
pub mod local;
pub mod router;
pub mod tree;

pub use local::{LocalTest, RoundHandle};
pub use router::{MessageCounts, NodeReport};
pub use tree::{Tree, TreeNode};

use std::time::Duration;

use treelot_lottery::LotteryError;
use treelot_protocol::ProtocolError;

/// Errors from the topology provider and the local router.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("Protocol setup failed: {0}")]
    Setup(#[source] LotteryError),

    #[error("Round failed to start: {0}")]
    Start(#[source] LotteryError),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Round did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Ticket already taken for this round")]
    TicketTaken,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
