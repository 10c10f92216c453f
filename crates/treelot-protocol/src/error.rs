use thiserror::Error;

use crate::{MessageKind, NodeId, NodeState};

/// Errors raised by a protocol instance during a round.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Node {0} is not the root; only the root can start a round")]
    NotRoot(NodeId),

    #[error("Node {node} cannot move from {from} to {to}")]
    InvalidTransition {
        node: NodeId,
        from: NodeState,
        to: NodeState,
    },

    #[error("No handler bound for {0} messages")]
    UnboundHandler(MessageKind),

    #[error("Lottery ticket already published")]
    TicketAlreadyPublished,

    #[error("Lottery ticket abandoned before delivery")]
    TicketAbandoned,

    #[error("Transport error: {0}")]
    Transport(String),
}
