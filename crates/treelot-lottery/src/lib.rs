//! Lottery protocol instances.
//!
//! One [`LotteryProtocol`] runs per tree node per round. The root is
//! started by the caller, the Announce travels down, and every node
//! folds its own draw with its children's replies on the way back up.
//! The root hands the winning [`LotteryTicket`](treelot_protocol::LotteryTicket)
//! to the caller through a one-shot rendezvous.

pub mod dispatch;
pub mod draw;
pub mod factory;
pub mod instance;
pub mod mock_transport;
pub mod reduction;
pub mod ticket;

pub use dispatch::{Handler, HandlerTable, RegistrationError};
pub use draw::{CandidateDraw, DrawSource, FixedDraw, RandomDraw};
pub use factory::LotteryFactory;
pub use instance::{Inbound, LotteryProtocol, Transport};
pub use reduction::reduce;
pub use ticket::{ticket_channel, TicketHandle, TicketSink};

use treelot_protocol::{NodeId, ProtocolError};

/// Errors from building or driving a lottery instance.
#[derive(Debug, thiserror::Error)]
pub enum LotteryError {
    #[error("Couldn't register handler: {0}")]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("No fixed draw configured for node {0}")]
    MissingDraw(NodeId),
}
