//! One-shot rendezvous for the round's result.
//!
//! The root holds the [`TicketSink`], the caller holds the
//! [`TicketHandle`]. Publishing waits until the caller is actually
//! waiting, then hands the ticket over. Each side is used at most once.

use tokio::sync::oneshot;
use treelot_protocol::{LotteryTicket, ProtocolError};

type Slot = oneshot::Sender<LotteryTicket>;

/// Create a connected sink/handle pair.
pub fn ticket_channel() -> (TicketSink, TicketHandle) {
    let (waiter_tx, waiter_rx) = oneshot::channel();
    (
        TicketSink {
            waiter: Some(waiter_rx),
        },
        TicketHandle { waiter: waiter_tx },
    )
}

/// Producer side, owned by the root instance.
#[derive(Debug)]
pub struct TicketSink {
    waiter: Option<oneshot::Receiver<Slot>>,
}

impl TicketSink {
    /// Deliver the ticket once a consumer is attached.
    ///
    /// A second call fails with `TicketAlreadyPublished`. If the consumer
    /// is gone the ticket is dropped and `TicketAbandoned` is returned.
    pub async fn publish(&mut self, ticket: LotteryTicket) -> Result<(), ProtocolError> {
        let waiter = self
            .waiter
            .take()
            .ok_or(ProtocolError::TicketAlreadyPublished)?;
        let slot = waiter.await.map_err(|_| ProtocolError::TicketAbandoned)?;
        slot.send(ticket).map_err(|_| ProtocolError::TicketAbandoned)
    }

    pub fn is_published(&self) -> bool {
        self.waiter.is_none()
    }
}

/// Consumer side, handed to whoever started the round.
#[derive(Debug)]
pub struct TicketHandle {
    waiter: oneshot::Sender<Slot>,
}

impl TicketHandle {
    /// Wait for the ticket. Consumes the handle, so it can be read once.
    ///
    /// Fails with `TicketAbandoned` if the producer is dropped without
    /// publishing; never yields a partial result.
    pub async fn wait(self) -> Result<LotteryTicket, ProtocolError> {
        let (slot_tx, slot_rx) = oneshot::channel();
        self.waiter
            .send(slot_tx)
            .map_err(|_| ProtocolError::TicketAbandoned)?;
        slot_rx.await.map_err(|_| ProtocolError::TicketAbandoned)
    }
}
