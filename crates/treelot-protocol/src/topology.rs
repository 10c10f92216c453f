//! The part of the topology a protocol instance is allowed to see.
//!
//! Tree construction and addressing belong to the topology provider;
//! instances only ask where they sit and who their neighbours are.

use crate::{NodeId, NodeRole};

/// A node's place in the rooted spanning tree, fixed for a round.
pub trait TreePosition: Send + Sync {
    /// Stable identity of this node.
    fn id(&self) -> NodeId;

    /// Parent handle, `None` for the root.
    fn parent(&self) -> Option<NodeId>;

    /// Child handles in the order the provider assigned them.
    fn children(&self) -> &[NodeId];

    fn is_root(&self) -> bool {
        self.parent().is_none()
    }

    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    fn role(&self) -> NodeRole {
        if self.is_root() {
            NodeRole::Root
        } else if self.is_leaf() {
            NodeRole::Leaf
        } else {
            NodeRole::Internal
        }
    }
}
