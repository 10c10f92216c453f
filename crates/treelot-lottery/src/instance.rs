//! Per-node lottery state machine.
//!
//! Lifecycle of one instance:
//! 1. `new()` - bind the Announce and Reply handlers
//! 2. `start()` (root only) or an inbound Announce - propagate to children
//! 3. the batch of child replies (or, at a leaf, nothing) - reduce and emit
//! 4. `Done` - never touched again

use std::sync::Arc;

use treelot_protocol::{
    Announce, ChildReply, LotteryTicket, Message, MessageKind, NodeId, NodeRole, NodeState,
    ProtocolError, Reply, TreePosition, ANNOUNCE_GREETING,
};

use crate::dispatch::{Handler, HandlerTable};
use crate::draw::CandidateDraw;
use crate::ticket::{ticket_channel, TicketHandle, TicketSink};
use crate::{reduction, LotteryError};

/// Outbound side of the message router, as seen by an instance.
pub trait Transport: Send + Sync {
    /// Queue `msg` for delivery to `to`. Does not wait for delivery.
    fn send(&self, to: NodeId, msg: Message) -> Result<(), ProtocolError>;
}

/// What the router hands to an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Announce(Announce),
    /// The complete batch of replies, one per child.
    Replies(Vec<ChildReply>),
}

impl Inbound {
    pub fn kind(&self) -> MessageKind {
        match self {
            Inbound::Announce(_) => MessageKind::Announce,
            Inbound::Replies(_) => MessageKind::Reply,
        }
    }
}

/// One node's participation in one round.
pub struct LotteryProtocol {
    position: Arc<dyn TreePosition>,
    transport: Arc<dyn Transport>,
    draw: Box<dyn CandidateDraw>,
    handlers: HandlerTable,
    state: NodeState,
    best: Option<Reply>,
    /// Root only.
    sink: Option<TicketSink>,
    /// Root only, until the caller takes it.
    ticket: Option<TicketHandle>,
    replies_sent: u32,
    tickets_published: u32,
}

impl LotteryProtocol {
    /// Build an instance for the node at `position`, binding both handlers.
    pub fn new(
        position: Arc<dyn TreePosition>,
        transport: Arc<dyn Transport>,
        draw: Box<dyn CandidateDraw>,
    ) -> Result<Self, LotteryError> {
        let mut handlers = HandlerTable::new();
        handlers.bind_all(&[Handler::HandleAnnounce, Handler::HandleReply])?;
        handlers.ensure_complete()?;

        let (sink, ticket) = if position.is_root() {
            let (sink, handle) = ticket_channel();
            (Some(sink), Some(handle))
        } else {
            (None, None)
        };

        Ok(Self {
            position,
            transport,
            draw,
            handlers,
            state: NodeState::Created,
            best: None,
            sink,
            ticket,
            replies_sent: 0,
            tickets_published: 0,
        })
    }

    pub fn id(&self) -> NodeId {
        self.position.id()
    }

    pub fn role(&self) -> NodeRole {
        self.position.role()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_terminal()
    }

    /// Best (number, owner) this node settled on, once it has reduced.
    pub fn best(&self) -> Option<Reply> {
        self.best
    }

    pub fn replies_sent(&self) -> u32 {
        self.replies_sent
    }

    pub fn tickets_published(&self) -> u32 {
        self.tickets_published
    }

    /// Take the result handle. Only the root has one, and only once.
    pub fn take_ticket(&mut self) -> Option<TicketHandle> {
        self.ticket.take()
    }

    /// Open the round. Root only, once.
    ///
    /// Runs the local Announce handler directly; nothing is sent to self.
    pub async fn start(&mut self) -> Result<(), LotteryError> {
        if !self.position.is_root() {
            return Err(ProtocolError::NotRoot(self.id()).into());
        }
        tracing::debug!(node = %self.id(), "Starting lottery round");
        self.handle_announce(Announce::new(ANNOUNCE_GREETING)).await
    }

    /// Route an inbound message to the handler bound for its kind.
    pub async fn dispatch(&mut self, inbound: Inbound) -> Result<(), LotteryError> {
        let kind = inbound.kind();
        let handler = self.handlers.lookup(kind);
        match (handler, inbound) {
            (Some(Handler::HandleAnnounce), Inbound::Announce(msg)) => {
                self.handle_announce(msg).await
            }
            (Some(Handler::HandleReply), Inbound::Replies(replies)) => {
                self.handle_reply(replies).await
            }
            _ => Err(ProtocolError::UnboundHandler(kind).into()),
        }
    }

    /// Forward the announce to every child, or start replying at a leaf.
    pub async fn handle_announce(&mut self, msg: Announce) -> Result<(), LotteryError> {
        tracing::debug!(node = %self.id(), message = %msg.message, "Parent announces");

        if self.position.is_leaf() {
            return self.handle_reply(Vec::new()).await;
        }

        self.transition(NodeState::AwaitingChildren)?;
        let position = Arc::clone(&self.position);
        for child in position.children() {
            if let Err(e) = self.transport.send(*child, Message::Announce(msg.clone())) {
                tracing::warn!(node = %self.id(), child = %child, error = %e, "Announce not sent");
            }
        }
        Ok(())
    }

    /// Draw, fold in the children's replies and pass the best upward.
    ///
    /// The instance is `Done` afterwards whether or not emitting succeeded.
    pub async fn handle_reply(&mut self, incoming: Vec<ChildReply>) -> Result<(), LotteryError> {
        let expected = if self.position.is_leaf() {
            NodeState::Created
        } else {
            NodeState::AwaitingChildren
        };
        if self.state != expected {
            return Err(self.invalid(NodeState::Reducing).into());
        }
        self.transition(NodeState::Reducing)?;

        let result = self.reduce_and_emit(&incoming).await;
        self.transition(NodeState::Done)?;
        result
    }

    async fn reduce_and_emit(&mut self, incoming: &[ChildReply]) -> Result<(), LotteryError> {
        let id = self.id();
        let own = Reply::new(self.draw.draw(id), id);
        tracing::info!(node = %id, number = own.number, "Draws lottery number");

        let best = reduction::reduce(own, incoming);
        self.best = Some(best);
        tracing::info!(
            node = %id,
            number = best.number,
            owner = %best.owner_id,
            children = incoming.len(),
            "Done with lottery number"
        );

        let parent = self.position.parent();
        match parent {
            Some(parent) => {
                tracing::debug!(node = %id, parent = %parent, "Sending to parent");
                self.transport.send(parent, Message::Reply(best))?;
                self.replies_sent += 1;
            }
            None => {
                let sink = self
                    .sink
                    .as_mut()
                    .ok_or(ProtocolError::TicketAlreadyPublished)?;
                tracing::info!(
                    number = best.number,
                    owner = %best.owner_id,
                    "Root is done, biggest lottery number found"
                );
                sink.publish(LotteryTicket::from(best)).await?;
                self.tickets_published += 1;
            }
        }
        Ok(())
    }

    fn transition(&mut self, next: NodeState) -> Result<(), ProtocolError> {
        if !self.state.can_transition_to(next) {
            return Err(self.invalid(next));
        }
        tracing::trace!(node = %self.id(), from = %self.state, to = %next, "State transition");
        self.state = next;
        Ok(())
    }

    fn invalid(&self, to: NodeState) -> ProtocolError {
        ProtocolError::InvalidTransition {
            node: self.id(),
            from: self.state,
            to,
        }
    }
}

impl std::fmt::Debug for LotteryProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LotteryProtocol")
            .field("id", &self.id())
            .field("role", &self.role())
            .field("state", &self.state)
            .field("best", &self.best)
            .finish()
    }
}
