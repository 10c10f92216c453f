//! Named factory handed to the layer that builds trees and starts rounds.

use std::sync::Arc;

use treelot_protocol::{TreePosition, PROTOCOL_NAME};

use crate::draw::DrawSource;
use crate::instance::{LotteryProtocol, Transport};
use crate::LotteryError;

/// Builds one fresh [`LotteryProtocol`] per node per round.
#[derive(Debug, Clone, Default)]
pub struct LotteryFactory {
    draws: DrawSource,
}

impl LotteryFactory {
    pub fn new(draws: DrawSource) -> Self {
        Self { draws }
    }

    /// Name the protocol is resolved under.
    pub fn name(&self) -> &'static str {
        PROTOCOL_NAME
    }

    pub fn instantiate(
        &self,
        position: Arc<dyn TreePosition>,
        transport: Arc<dyn Transport>,
    ) -> Result<LotteryProtocol, LotteryError> {
        let draw = self.draws.for_node(position.id())?;
        LotteryProtocol::new(position, transport, draw)
    }
}
