//! Max-with-owner aggregation.

use treelot_protocol::{ChildReply, Reply};

/// Fold children's replies into the node's own candidate.
///
/// A reply only replaces the incumbent when its number is strictly
/// greater, so on ties the value already held wins: the node's own draw
/// first, then earlier replies in delivery order.
pub fn reduce(own: Reply, incoming: &[ChildReply]) -> Reply {
    incoming.iter().fold(own, |best, child| {
        if child.reply.number > best.number {
            child.reply
        } else {
            best
        }
    })
}
