//! Optimistic-send reconciliation.
//!
//! The reconciler owns the optimistic-send protocol for the open thread:
//! a locally created pending entry appears immediately, and is later swapped
//! for the two server-confirmed records (user echo + assistant reply) in a
//! single list replacement, or removed entirely on failure. Readers of the
//! [`MessageStore`] never observe the temporary entry coexisting with its
//! confirmed counterpart, and never observe a partial swap.
//!
//! The list transitions themselves are pure functions over `Vec<Message>`
//! so the swap is one atomic write under the store's lock.

use tokio::sync::Mutex;

use crate::backend::{MessageRecord, SendOutcome};
use crate::error::{AmoraError, Result};
use crate::thread::{Message, MessageRole, MessageStore};

/// Token for a send in flight: the temporary id to reconcile against and
/// the original text, returned to the caller as a restorable draft on
/// rollback. The temporary id is never reused once the token is consumed.
#[derive(Debug)]
pub struct PendingSend {
    temp_id: String,
    thread_id: String,
    text: String,
}

impl PendingSend {
    /// The client-generated temporary message id.
    pub fn temp_id(&self) -> &str {
        &self.temp_id
    }

    /// The original message text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Maintains the canonical message list and applies the optimistic-send
/// protocol. One send may be outstanding at a time; a second `begin_send`
/// while one is in flight is rejected without touching the list.
pub struct MessageReconciler {
    store: MessageStore,
    /// The single outstanding-send slot.
    in_flight: Mutex<Option<String>>,
}

impl MessageReconciler {
    /// Creates a reconciler over the shared message store.
    pub fn new(store: MessageStore) -> Self {
        Self {
            store,
            in_flight: Mutex::new(None),
        }
    }

    /// Replaces the list with server history (thread open / switch).
    ///
    /// Any stale in-flight marker from a previous thread is cleared; its
    /// temporary entry does not survive the replacement either.
    pub async fn load_history(&self, thread_id: &str, records: Vec<MessageRecord>) {
        let messages = records
            .into_iter()
            .map(|r| Message::confirmed(r.id, thread_id, r.role, r.content, r.created_at))
            .collect();
        *self.in_flight.lock().await = None;
        self.store.replace(messages).await;
    }

    /// Starts the optimistic protocol: validates the text, appends the
    /// pending entry, and returns the token to reconcile with later.
    ///
    /// # Errors
    ///
    /// - `Validation` if the text is empty or whitespace-only (the list is
    ///   untouched and the remote send must not be invoked)
    /// - `Validation` (busy) if a send is already outstanding
    pub async fn begin_send(&self, thread_id: &str, text: &str) -> Result<PendingSend> {
        if text.trim().is_empty() {
            return Err(AmoraError::validation("message text is empty"));
        }

        let mut in_flight = self.in_flight.lock().await;
        if in_flight.is_some() {
            tracing::warn!(thread_id, "send rejected: another send is outstanding");
            return Err(AmoraError::busy("send"));
        }

        let message = Message::pending_user(thread_id, text);
        let token = PendingSend {
            temp_id: message.id.clone(),
            thread_id: thread_id.to_string(),
            text: text.to_string(),
        };

        *in_flight = Some(message.id.clone());
        self.store.append(message).await;
        tracing::debug!(thread_id, temp_id = %token.temp_id, "optimistic entry appended");
        Ok(token)
    }

    /// Reconciles a successful send: the temporary entry is removed and the
    /// confirmed user echo plus assistant reply are appended, in one list
    /// replacement.
    ///
    /// When `reveal` is true the stored assistant entry starts with empty
    /// content (a reveal job will grow it); the returned message always
    /// carries the full server content for the revealer to work from.
    pub async fn confirm(
        &self,
        pending: PendingSend,
        outcome: SendOutcome,
        reveal: bool,
    ) -> Message {
        let user = Message::confirmed(
            outcome.user_message.id,
            &pending.thread_id,
            MessageRole::User,
            outcome.user_message.content,
            outcome.user_message.created_at,
        );
        let assistant = Message::confirmed(
            outcome.assistant_message.id,
            &pending.thread_id,
            MessageRole::Assistant,
            outcome.assistant_message.content,
            outcome.assistant_message.created_at,
        );

        let mut stored_assistant = assistant.clone();
        if reveal {
            stored_assistant.content = String::new();
        }

        let previous = self.store.snapshot().await;
        let next = reconciled_on_confirm(&previous, &pending.temp_id, user, stored_assistant);
        self.store.replace(next).await;
        *self.in_flight.lock().await = None;

        tracing::info!(
            thread_id = %pending.thread_id,
            assistant_id = %assistant.id,
            "send confirmed, optimistic entry reconciled"
        );
        assistant
    }

    /// Rolls a failed send back: the temporary entry is removed entirely
    /// (no `Failed`-tagged residue) and the original text is returned as a
    /// restorable draft.
    pub async fn rollback(&self, pending: PendingSend) -> String {
        let previous = self.store.snapshot().await;
        let next = without_message(&previous, &pending.temp_id);
        self.store.replace(next).await;
        *self.in_flight.lock().await = None;

        tracing::warn!(
            thread_id = %pending.thread_id,
            temp_id = %pending.temp_id,
            "send failed, optimistic entry rolled back"
        );
        pending.text
    }

    /// Returns true if a send is currently outstanding.
    pub async fn has_in_flight(&self) -> bool {
        self.in_flight.lock().await.is_some()
    }
}

/// List transition for a confirmed send: drops the temporary entry and
/// appends the confirmed pair, preserving everything else in order.
fn reconciled_on_confirm(
    previous: &[Message],
    temp_id: &str,
    user: Message,
    assistant: Message,
) -> Vec<Message> {
    let mut next = without_message(previous, temp_id);
    next.push(user);
    next.push(assistant);
    next
}

/// List transition that removes one message by id.
fn without_message(previous: &[Message], id: &str) -> Vec<Message> {
    previous.iter().filter(|m| m.id != id).cloned().collect()
}
