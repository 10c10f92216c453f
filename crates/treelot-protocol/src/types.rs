//! Identities, roles and the lottery ticket.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable numeric identity of a node, unique within a round.
///
/// The local topology provider uses the node's roster index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Position of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Root,
    Internal,
    Leaf,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRole::Root => write!(f, "root"),
            NodeRole::Internal => write!(f, "internal"),
            NodeRole::Leaf => write!(f, "leaf"),
        }
    }
}

/// Lifecycle of a protocol instance within one round.
///
/// `Created -> AwaitingChildren -> Reducing -> Done` for nodes with children,
/// `Created -> Reducing -> Done` for leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Created,
    AwaitingChildren,
    Reducing,
    Done,
}

impl NodeState {
    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (NodeState::Created, NodeState::AwaitingChildren)
                | (NodeState::Created, NodeState::Reducing)
                | (NodeState::AwaitingChildren, NodeState::Reducing)
                | (NodeState::Reducing, NodeState::Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == NodeState::Done
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Created => write!(f, "created"),
            NodeState::AwaitingChildren => write!(f, "awaiting_children"),
            NodeState::Reducing => write!(f, "reducing"),
            NodeState::Done => write!(f, "done"),
        }
    }
}

/// Result of a round: the largest number drawn in the tree and who drew it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryTicket {
    pub number: u32,
    pub owner_id: NodeId,
}

impl LotteryTicket {
    pub fn new(number: u32, owner_id: NodeId) -> Self {
        Self { number, owner_id }
    }
}

impl fmt::Display for LotteryTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} (owner {})", self.number, self.owner_id)
    }
}
