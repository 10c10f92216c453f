//! In-memory transport for exercising instances without a router.
//!
//! Records every message instead of delivering it, so tests can assert on
//! exactly what a handler sent and to whom.

use std::sync::Mutex;

use treelot_protocol::{Message, NodeId, ProtocolError};

use crate::instance::Transport;

#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<(NodeId, Message)>>,
    /// Fail every send when set.
    pub refuse: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            refuse: true,
        }
    }

    /// Messages sent so far, in send order.
    pub fn sent(&self) -> Vec<(NodeId, Message)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, to: NodeId, msg: Message) -> Result<(), ProtocolError> {
        if self.refuse {
            return Err(ProtocolError::Transport(format!("send to {to} refused")));
        }
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| ProtocolError::Transport("recorder poisoned".into()))?;
        sent.push((to, msg));
        Ok(())
    }
}
