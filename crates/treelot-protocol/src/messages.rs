//! Messages exchanged between lottery instances.
//!
//! The set of message kinds is closed: handlers are bound per
//! [`MessageKind`] when an instance is constructed, never by inspecting
//! payload types at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{LotteryTicket, NodeId};

/// Sent from parent to children to open a round. Forwarded unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announce {
    pub message: String,
}

impl Announce {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Best candidate of a subtree, sent one hop from child to parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub number: u32,
    pub owner_id: NodeId,
}

impl Reply {
    pub fn new(number: u32, owner_id: NodeId) -> Self {
        Self { number, owner_id }
    }
}

impl From<Reply> for LotteryTicket {
    fn from(reply: Reply) -> Self {
        LotteryTicket::new(reply.number, reply.owner_id)
    }
}

/// A Reply together with the child that sent it, as handed to the reply
/// handler once the whole batch has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildReply {
    pub from: NodeId,
    pub reply: Reply,
}

/// Everything that travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Message {
    Announce(Announce),
    Reply(Reply),
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Announce(_) => MessageKind::Announce,
            Message::Reply(_) => MessageKind::Reply,
        }
    }
}

/// The closed set of message kinds a lottery instance handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Announce,
    Reply,
}

impl MessageKind {
    pub const ALL: [MessageKind; 2] = [MessageKind::Announce, MessageKind::Reply];

    /// Slot of this kind in a dispatch table.
    pub fn index(self) -> usize {
        match self {
            MessageKind::Announce => 0,
            MessageKind::Reply => 1,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Announce => write!(f, "announce"),
            MessageKind::Reply => write!(f, "reply"),
        }
    }
}
