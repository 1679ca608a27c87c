//! Append-only conversation history.

use crate::types::ChatMessage;

/// Ordered record of one session's turns.
///
/// Insertion order is the conversation order and is replayed verbatim as
/// model context. There is no API for removing or reordering entries.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Appending is the only mutation.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// All messages, in insertion order.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Owned copy of the history.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }

    /// The last `n` messages.
    pub fn last_n(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
