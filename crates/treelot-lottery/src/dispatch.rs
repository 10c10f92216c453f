//! Static handler table.
//!
//! Each [`MessageKind`] has exactly one slot. Instances bind their two
//! handlers at construction; a conflicting or mismatched binding is a
//! setup error and the instance is never handed out.

use std::fmt;

use treelot_protocol::MessageKind;

/// Handlers a lottery instance exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    HandleAnnounce,
    HandleReply,
}

impl Handler {
    /// The message kind this handler consumes.
    pub fn accepts(self) -> MessageKind {
        match self {
            Handler::HandleAnnounce => MessageKind::Announce,
            Handler::HandleReply => MessageKind::Reply,
        }
    }
}

impl fmt::Display for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::HandleAnnounce => write!(f, "HandleAnnounce"),
            Handler::HandleReply => write!(f, "HandleReply"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("{kind} already bound to {existing}")]
    AlreadyBound { kind: MessageKind, existing: Handler },

    #[error("{handler} cannot handle {kind} messages")]
    KindMismatch { kind: MessageKind, handler: Handler },

    #[error("no handler bound for {0}")]
    Unbound(MessageKind),
}

/// Maps each message kind to the handler bound for it.
#[derive(Debug, Clone, Default)]
pub struct HandlerTable {
    slots: [Option<Handler>; MessageKind::ALL.len()],
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `kind`. Each kind can be bound once.
    pub fn bind(&mut self, kind: MessageKind, handler: Handler) -> Result<(), RegistrationError> {
        if handler.accepts() != kind {
            return Err(RegistrationError::KindMismatch { kind, handler });
        }
        let slot = &mut self.slots[kind.index()];
        if let Some(existing) = *slot {
            return Err(RegistrationError::AlreadyBound { kind, existing });
        }
        *slot = Some(handler);
        Ok(())
    }

    /// Bind every handler in order, stopping at the first failure.
    pub fn bind_all(&mut self, handlers: &[Handler]) -> Result<(), RegistrationError> {
        for handler in handlers {
            self.bind(handler.accepts(), *handler)?;
        }
        Ok(())
    }

    pub fn lookup(&self, kind: MessageKind) -> Option<Handler> {
        self.slots[kind.index()]
    }

    /// Fails if any message kind is left without a handler.
    pub fn ensure_complete(&self) -> Result<(), RegistrationError> {
        match MessageKind::ALL.iter().find(|k| self.lookup(**k).is_none()) {
            Some(kind) => Err(RegistrationError::Unbound(*kind)),
            None => Ok(()),
        }
    }
}
