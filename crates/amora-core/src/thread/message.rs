//! Conversation message types.
//!
//! This module contains types for representing messages in a thread,
//! including roles, delivery state, and the optimistic-entry constructor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of client-generated temporary message ids. A temporary id exists
/// only between the optimistic insert and its confirmation or rollback, and
/// is never reused afterwards.
const TEMP_ID_PREFIX: &str = "tmp-";

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// Delivery state of a message in the thread list.
///
/// `Pending` marks a locally created, not-yet-server-confirmed entry. At
/// most one pending message exists per open thread; a failed send removes
/// the entry entirely rather than tagging it `Failed`, so `Failed` only
/// appears if a backend ever reports it in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    Pending,
    Confirmed,
    Failed,
}

/// A single message in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier. Server-issued once confirmed; `tmp-<uuid>` while
    /// the message is an optimistic local entry.
    pub id: String,
    /// The thread this message belongs to.
    pub thread_id: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The message content. For an assistant message under an active reveal
    /// job this holds the currently revealed prefix.
    pub content: String,
    /// Timestamp when the message was created.
    pub created_at: DateTime<Utc>,
    /// Delivery state of this message.
    pub delivery_state: DeliveryState,
}

impl Message {
    /// Creates an optimistic user message with a fresh temporary id.
    pub fn pending_user(thread_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("{TEMP_ID_PREFIX}{}", Uuid::new_v4()),
            thread_id: thread_id.into(),
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
            delivery_state: DeliveryState::Pending,
        }
    }

    /// Creates a server-confirmed message.
    pub fn confirmed(
        id: impl Into<String>,
        thread_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role,
            content: content.into(),
            created_at,
            delivery_state: DeliveryState::Confirmed,
        }
    }

    /// Returns true if this message carries a client-generated temporary id.
    pub fn is_temporary(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    /// Returns true if this message is awaiting server confirmation.
    pub fn is_pending(&self) -> bool {
        self.delivery_state == DeliveryState::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_user_is_temporary_and_pending() {
        let msg = Message::pending_user("t1", "hello");
        assert!(msg.is_temporary());
        assert!(msg.is_pending());
        assert_eq!(msg.role, MessageRole::User);
    }

    #[test]
    fn test_temporary_ids_are_unique() {
        let a = Message::pending_user("t1", "x");
        let b = Message::pending_user("t1", "x");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_confirmed_is_not_temporary() {
        let msg = Message::confirmed("m1", "t1", MessageRole::Assistant, "hi", Utc::now());
        assert!(!msg.is_temporary());
        assert_eq!(msg.delivery_state, DeliveryState::Confirmed);
    }
}
