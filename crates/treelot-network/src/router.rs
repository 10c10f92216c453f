//! Local message router.
//!
//! Every node gets an unbounded mailbox and a driver task that owns its
//! protocol instance. The driver decodes wire messages, checks they come
//! from the right neighbour and holds child replies back until the whole
//! batch is in, then invokes the instance once with the batch in child
//! order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use treelot_lottery::{Inbound, LotteryError, LotteryProtocol, Transport};
use treelot_protocol::{
    ChildReply, Message, MessageKind, NodeId, NodeRole, NodeState, ProtocolError, Reply,
    TreePosition,
};

use crate::codec::{self, Envelope};

/// What lands in a node's mailbox.
#[derive(Debug)]
pub(crate) enum Delivery {
    /// Local call from the round owner; only ever sent to the root.
    Start(oneshot::Sender<Result<(), LotteryError>>),
    Wire(Envelope),
}

pub(crate) type Mailboxes = Arc<HashMap<NodeId, mpsc::UnboundedSender<Delivery>>>;

/// Wire traffic seen during a round.
#[derive(Debug, Default)]
pub struct RoundStats {
    announces: AtomicU64,
    replies: AtomicU64,
    dropped: AtomicU64,
}

impl RoundStats {
    fn record_sent(&self, kind: MessageKind) {
        let counter = match kind {
            MessageKind::Announce => &self.announces,
            MessageKind::Reply => &self.replies,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MessageCounts {
        MessageCounts {
            announces: self.announces.load(Ordering::Relaxed),
            replies: self.replies.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageCounts {
    pub announces: u64,
    pub replies: u64,
    /// Messages the router refused to hand to an instance.
    pub dropped: u64,
}

impl MessageCounts {
    pub fn total_sent(&self) -> u64 {
        self.announces + self.replies
    }
}

/// [`Transport`] handed to one node: encodes and posts into the peer's mailbox.
pub(crate) struct RouterTransport {
    local: NodeId,
    mailboxes: Mailboxes,
    stats: Arc<RoundStats>,
}

impl RouterTransport {
    pub(crate) fn new(local: NodeId, mailboxes: Mailboxes, stats: Arc<RoundStats>) -> Self {
        Self {
            local,
            mailboxes,
            stats,
        }
    }
}

impl Transport for RouterTransport {
    fn send(&self, to: NodeId, msg: Message) -> Result<(), ProtocolError> {
        let mailbox = self
            .mailboxes
            .get(&to)
            .ok_or_else(|| ProtocolError::Transport(format!("unknown peer {to}")))?;
        let payload = codec::encode(&msg).map_err(|e| ProtocolError::Transport(e.to_string()))?;

        tracing::trace!(from = %self.local, to = %to, kind = %msg.kind(), bytes = payload.len(), "Routing message");
        // Counted before posting so the count is never behind the receiver.
        self.stats.record_sent(msg.kind());
        mailbox
            .send(Delivery::Wire(Envelope {
                from: self.local,
                payload,
            }))
            .map_err(|_| ProtocolError::Transport(format!("mailbox of {to} closed")))?;
        Ok(())
    }
}

/// How one node's participation in a round ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub id: NodeId,
    pub role: NodeRole,
    pub state: NodeState,
    pub best: Option<Reply>,
    pub replies_received: usize,
    pub replies_sent: u32,
    pub tickets_published: u32,
}

/// Drive one instance until it is done or its mailbox closes.
pub(crate) async fn run_node(
    mut instance: LotteryProtocol,
    position: Arc<dyn TreePosition>,
    mut inbox: mpsc::UnboundedReceiver<Delivery>,
    stats: Arc<RoundStats>,
) -> NodeReport {
    let id = position.id();
    let children = position.children();
    let mut pending: Vec<ChildReply> = Vec::with_capacity(children.len());
    let mut replies_received = 0;

    while let Some(delivery) = inbox.recv().await {
        let result = match delivery {
            Delivery::Start(ack) => {
                let result = instance.start().await;
                let failed = result.is_err();
                if let Err(e) = &result {
                    tracing::error!(node = %id, error = %e, "Round failed to start");
                }
                let _ = ack.send(result);
                if failed {
                    break;
                }
                Ok(())
            }
            Delivery::Wire(envelope) => {
                let msg = match codec::decode(&envelope.payload) {
                    Ok(msg) => msg,
                    Err(e) => {
                        tracing::warn!(node = %id, from = %envelope.from, error = %e, "Undecodable message dropped");
                        stats.record_dropped();
                        continue;
                    }
                };
                match msg {
                    Message::Announce(announce) => {
                        if position.parent() != Some(envelope.from) {
                            tracing::warn!(node = %id, from = %envelope.from, "Announce from non-parent dropped");
                            stats.record_dropped();
                            continue;
                        }
                        instance.dispatch(Inbound::Announce(announce)).await
                    }
                    Message::Reply(reply) => {
                        if !children.contains(&envelope.from) {
                            tracing::warn!(node = %id, from = %envelope.from, "Reply from non-child dropped");
                            stats.record_dropped();
                            continue;
                        }
                        if pending.iter().any(|c| c.from == envelope.from) {
                            tracing::warn!(node = %id, from = %envelope.from, "Duplicate reply dropped");
                            stats.record_dropped();
                            continue;
                        }
                        pending.push(ChildReply {
                            from: envelope.from,
                            reply,
                        });
                        replies_received += 1;
                        if pending.len() < children.len() {
                            tracing::trace!(node = %id, have = pending.len(), want = children.len(), "Waiting for children");
                            continue;
                        }
                        // Hand the batch over in child order, independent of arrival.
                        pending.sort_by_key(|c| children.iter().position(|child| *child == c.from));
                        instance
                            .dispatch(Inbound::Replies(std::mem::take(&mut pending)))
                            .await
                    }
                }
            }
        };

        if let Err(e) = result {
            tracing::warn!(node = %id, error = %e, "Handler failed");
        }
        if instance.is_done() {
            break;
        }
    }

    NodeReport {
        id,
        role: instance.role(),
        state: instance.state(),
        best: instance.best(),
        replies_received,
        replies_sent: instance.replies_sent(),
        tickets_published: instance.tickets_published(),
    }
}
