//! Shared message list for the open thread.
//!
//! Exactly one list of messages exists per open thread. The store is the
//! single shared in-memory resource across pipeline components: the
//! reconciler replaces it wholesale, the streaming revealer mutates one
//! assistant entry's content, and the presentation layer reads snapshots.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::message::Message;

/// Thread-safe, cheaply clonable handle to the canonical message list.
#[derive(Clone, Default)]
pub struct MessageStore {
    inner: Arc<RwLock<Vec<Message>>>,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current list in order.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.inner.read().await.clone()
    }

    /// Number of messages currently in the list.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns true if the list is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Replaces the whole list in one step.
    ///
    /// This is the only way multi-message transitions (history load,
    /// optimistic confirmation, rollback) are applied, so readers never
    /// observe an intermediate state.
    pub async fn replace(&self, messages: Vec<Message>) {
        *self.inner.write().await = messages;
    }

    /// Appends a single message to the end of the list.
    pub async fn append(&self, message: Message) {
        self.inner.write().await.push(message);
    }

    /// Overwrites the content of the message with the given id.
    ///
    /// Returns false if no such message exists (e.g. the list was replaced
    /// while a reveal job was still ticking).
    pub async fn set_content(&self, message_id: &str, content: String) -> bool {
        let mut messages = self.inner.write().await;
        match messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.content = content;
                true
            }
            None => false,
        }
    }

    /// Returns the content of the message with the given id, if present.
    pub async fn content_of(&self, message_id: &str) -> Option<String> {
        self.inner
            .read()
            .await
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| m.content.clone())
    }

    /// Returns true if any message in the list is still pending.
    pub async fn has_pending(&self) -> bool {
        self.inner.read().await.iter().any(|m| m.is_pending())
    }
}
