//! Run lottery rounds over an in-process tree.
//!
//! Factories are handed to [`LocalTest`] explicitly and resolved by name
//! when a round starts; there is no global registry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::Instrument;
use treelot_lottery::{LotteryError, LotteryFactory, TicketHandle};
use treelot_protocol::{LotteryTicket, NodeId, ProtocolError, TreePosition};
use uuid::Uuid;

use crate::router::{run_node, Delivery, MessageCounts, NodeReport, RoundStats, RouterTransport};
use crate::tree::Tree;
use crate::NetworkError;

/// Builds and starts rounds with the factories it was given.
#[derive(Debug, Default)]
pub struct LocalTest {
    factories: HashMap<&'static str, LotteryFactory>,
}

impl LocalTest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `factory` available under its protocol name. Replaces any
    /// factory previously given for that name.
    pub fn register(&mut self, factory: LotteryFactory) -> &mut Self {
        self.factories.insert(factory.name(), factory);
        self
    }

    pub fn with_factory(mut self, factory: LotteryFactory) -> Self {
        self.register(factory);
        self
    }

    /// Instantiate `name` on every node of `tree`, spawn the node drivers
    /// and start the root. Must be called from within a tokio runtime.
    ///
    /// Setup errors surface here, before any task is spawned.
    pub fn start_protocol(&self, name: &str, tree: &Tree) -> Result<RoundHandle, NetworkError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| NetworkError::UnknownProtocol(name.to_string()))?;

        let round_id = Uuid::new_v4();
        tracing::debug!(round = %round_id, nodes = tree.len(), "Tree:\n{}", tree.dump());

        let mut senders = HashMap::with_capacity(tree.len());
        let mut inboxes = HashMap::with_capacity(tree.len());
        for node in tree.nodes() {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(node.id(), tx);
            inboxes.insert(node.id(), rx);
        }
        let mailboxes = Arc::new(senders);
        let stats = Arc::new(RoundStats::default());

        let mut instances = Vec::with_capacity(tree.len());
        for node in tree.nodes() {
            let position: Arc<dyn TreePosition> = node.clone();
            let transport = Arc::new(RouterTransport::new(
                node.id(),
                Arc::clone(&mailboxes),
                Arc::clone(&stats),
            ));
            let instance = factory
                .instantiate(Arc::clone(&position), transport)
                .map_err(NetworkError::Setup)?;
            instances.push((position, instance));
        }

        let root_id = tree.root().id();
        let mut ticket = None;
        let mut tasks = JoinSet::new();
        for (position, mut instance) in instances {
            let id = position.id();
            if id == root_id {
                ticket = instance.take_ticket();
            }
            let inbox = inboxes
                .remove(&id)
                .ok_or_else(|| NetworkError::InvalidTopology(format!("no mailbox for {id}")))?;
            let span = tracing::info_span!("node", round = %round_id, node = %id);
            tasks.spawn(run_node(instance, position, inbox, Arc::clone(&stats)).instrument(span));
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        mailboxes
            .get(&root_id)
            .ok_or_else(|| NetworkError::InvalidTopology(format!("no mailbox for root {root_id}")))?
            .send(Delivery::Start(ack_tx))
            .map_err(|_| ProtocolError::Transport("root mailbox closed".into()))?;

        tracing::info!(round = %round_id, nodes = tree.len(), root = %root_id, "Lottery round started");

        Ok(RoundHandle {
            round_id,
            root: root_id,
            ticket,
            started: Some(ack_rx),
            tasks,
            stats,
        })
    }
}

/// The caller's side of a running round.
///
/// Dropping the handle aborts every node driver still waiting.
#[derive(Debug)]
pub struct RoundHandle {
    round_id: Uuid,
    root: NodeId,
    ticket: Option<TicketHandle>,
    started: Option<oneshot::Receiver<Result<(), LotteryError>>>,
    tasks: JoinSet<NodeReport>,
    stats: Arc<RoundStats>,
}

impl RoundHandle {
    pub fn round_id(&self) -> Uuid {
        self.round_id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Wait up to `timeout` for the root's ticket. Yields it at most once.
    pub async fn ticket(&mut self, timeout: Duration) -> Result<LotteryTicket, NetworkError> {
        let handle = self.ticket.take().ok_or(NetworkError::TicketTaken)?;
        match tokio::time::timeout(timeout, handle.wait()).await {
            Err(_) => {
                tracing::warn!(round = %self.round_id, ?timeout, "Round timed out");
                Err(NetworkError::Timeout(timeout))
            }
            Ok(Ok(ticket)) => {
                tracing::info!(round = %self.round_id, number = ticket.number, owner = %ticket.owner_id, "Round complete");
                Ok(ticket)
            }
            Ok(Err(e)) => {
                // The root went away without publishing; report why if start failed.
                if let Some(started) = self.started.take() {
                    if let Ok(Err(start_err)) = started.await {
                        return Err(NetworkError::Start(start_err));
                    }
                }
                Err(e.into())
            }
        }
    }

    pub fn message_counts(&self) -> MessageCounts {
        self.stats.snapshot()
    }

    /// Wait for every node driver to finish and collect their reports,
    /// ordered by node id.
    ///
    /// A stalled round never finishes; drop the handle instead.
    pub async fn finish(mut self) -> Vec<NodeReport> {
        // An unread ticket would keep the root waiting for a consumer.
        self.ticket.take();
        let mut reports = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!(round = %self.round_id, error = %e, "Node driver failed"),
            }
        }
        reports.sort_by_key(|r| r.id);
        reports
    }
}
