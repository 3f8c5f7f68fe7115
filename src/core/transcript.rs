//! Append-only conversation transcript.

use super::message::Message;

#[derive(Debug, Default, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drops every message. Only call this once the backend has confirmed the
    /// history reset, otherwise the two views diverge.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended at or after `index`.
    pub fn since(&self, index: usize) -> &[Message] {
        self.messages.get(index..).unwrap_or(&[])
    }

    pub fn last_system(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|message| message.is_system())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
