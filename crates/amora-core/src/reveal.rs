//! Incremental reveal of an assistant reply.
//!
//! The full reply is already in memory when the reveal starts; this is a
//! presentation effect, not token streaming. A spawned task grows the
//! message's visible content by a fixed character batch per tick until it
//! equals the full text, at which point the final tick assigns the full
//! text verbatim so accumulation can never drift. Cancellation stops the
//! task immediately and leaves whatever prefix had been revealed; it never
//! auto-completes.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::thread::MessageStore;

/// Interval between reveal ticks.
const TICK: Duration = Duration::from_millis(6);
/// Characters revealed per tick. Batching keeps the total duration low
/// enough that the reveal reads as effectively real-time.
const CHARS_PER_TICK: usize = 4;

struct ActiveJob {
    message_id: String,
    handle: JoinHandle<()>,
}

/// Reveals assistant replies into the shared message list, one job at a
/// time. Starting a new job cancels any prior active one.
#[derive(Default)]
pub struct StreamingRevealer {
    job: Mutex<Option<ActiveJob>>,
}

impl StreamingRevealer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins revealing `full_text` into the message with `message_id`.
    ///
    /// Any previously active job is cancelled first; only one job runs at a
    /// time. The job ends on its own once the content equals `full_text`.
    pub async fn start(&self, message_id: impl Into<String>, full_text: String, store: MessageStore) {
        let message_id = message_id.into();
        let mut slot = self.job.lock().await;
        if let Some(previous) = slot.take() {
            tracing::debug!(message_id = %previous.message_id, "cancelling prior reveal job");
            previous.handle.abort();
        }

        let id = message_id.clone();
        let handle = tokio::spawn(async move {
            run_reveal(&id, full_text, store).await;
        });

        *slot = Some(ActiveJob { message_id, handle });
    }

    /// Cancels the active job, if any, leaving the revealed prefix in place.
    ///
    /// Callers that need the full text after cancelling (e.g. on thread
    /// switch) must have snapshotted it separately.
    pub async fn cancel(&self) {
        let mut slot = self.job.lock().await;
        if let Some(job) = slot.take() {
            tracing::debug!(message_id = %job.message_id, "reveal job cancelled");
            job.handle.abort();
        }
    }

    /// Returns true while a reveal job is still running.
    pub async fn is_active(&self) -> bool {
        let slot = self.job.lock().await;
        slot.as_ref().is_some_and(|job| !job.handle.is_finished())
    }

    /// Waits for the active job to finish (completion or cancellation).
    /// Intended for teardown and tests; a no-op when nothing is active.
    pub async fn wait(&self) {
        let job = self.job.lock().await.take();
        if let Some(job) = job {
            // Abort surfaces as a JoinError; either way the job is done.
            let _ = job.handle.await;
        }
    }
}

/// The tick loop. Prefixes are built on char boundaries so a cancelled
/// reveal is always a strict, well-formed prefix of the full text.
async fn run_reveal(message_id: &str, full_text: String, store: MessageStore) {
    let chars: Vec<char> = full_text.chars().collect();
    let mut revealed = 0usize;

    loop {
        tokio::time::sleep(TICK).await;
        revealed = (revealed + CHARS_PER_TICK).min(chars.len());

        if revealed >= chars.len() {
            // Final tick: assign the full text verbatim.
            if !store.set_content(message_id, full_text.clone()).await {
                tracing::debug!(message_id, "reveal target gone, job ending");
            }
            return;
        }

        let prefix: String = chars[..revealed].iter().collect();
        if !store.set_content(message_id, prefix).await {
            // The list was replaced under us (thread switch); stop quietly.
            tracing::debug!(message_id, "reveal target gone, job ending");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::{Message, MessageRole};
    use chrono::Utc;

    async fn store_with_assistant(id: &str) -> MessageStore {
        let store = MessageStore::new();
        store
            .append(Message::confirmed(
                id,
                "t1",
                MessageRole::Assistant,
                "",
                Utc::now(),
            ))
            .await;
        store
    }

    #[tokio::test]
    async fn test_reveal_completes_exactly() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();
        let full = "Lead with something specific you noticed.".to_string();

        revealer.start("a1", full.clone(), store.clone()).await;
        revealer.wait().await;

        assert_eq!(store.content_of("a1").await.as_deref(), Some(full.as_str()));
        assert!(!revealer.is_active().await);
    }

    #[tokio::test]
    async fn test_reveal_empty_string() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();

        revealer.start("a1", String::new(), store.clone()).await;
        revealer.wait().await;

        assert_eq!(store.content_of("a1").await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_reveal_shorter_than_one_tick() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();

        revealer.start("a1", "Hi".to_string(), store.clone()).await;
        revealer.wait().await;

        assert_eq!(store.content_of("a1").await.as_deref(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_reveal_multibyte_text_completes_exactly() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();
        let full = "Sé específico — menciona algo que notaste ✨".to_string();

        revealer.start("a1", full.clone(), store.clone()).await;
        revealer.wait().await;

        assert_eq!(store.content_of("a1").await.as_deref(), Some(full.as_str()));
    }

    #[tokio::test]
    async fn test_grows_as_prefixes() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();
        let full = "Lead with something specific you noticed.".to_string();

        revealer.start("a1", full.clone(), store.clone()).await;

        let mut seen = Vec::new();
        loop {
            let content = store.content_of("a1").await.unwrap();
            if seen.last() != Some(&content) {
                seen.push(content.clone());
            }
            if content == full {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        revealer.wait().await;

        // Every observed state is a prefix of the next, ending at the full text.
        for pair in seen.windows(2) {
            assert!(pair[1].starts_with(&pair[0]), "{:?} -> {:?}", pair[0], pair[1]);
        }
        assert_eq!(seen.last().unwrap(), &full);
    }

    #[tokio::test]
    async fn test_cancel_leaves_strict_prefix() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();
        let full = "x".repeat(4000);

        revealer.start("a1", full.clone(), store.clone()).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        revealer.cancel().await;

        let content = store.content_of("a1").await.unwrap();
        assert!(content.len() < full.len());
        assert!(full.starts_with(&content));

        // Cancel never auto-completes; the content stays put.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.content_of("a1").await.unwrap(), content);
        assert!(!revealer.is_active().await);
    }

    #[tokio::test]
    async fn test_starting_new_job_cancels_prior() {
        let store = store_with_assistant("a1").await;
        store
            .append(Message::confirmed(
                "a2",
                "t1",
                MessageRole::Assistant,
                "",
                Utc::now(),
            ))
            .await;
        let revealer = StreamingRevealer::new();
        let long = "y".repeat(4000);

        revealer.start("a1", long.clone(), store.clone()).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        revealer.start("a2", "short".to_string(), store.clone()).await;
        revealer.wait().await;

        // The first job stopped where it was; the second ran to completion.
        let first = store.content_of("a1").await.unwrap();
        assert!(first.len() < long.len());
        assert_eq!(store.content_of("a2").await.as_deref(), Some("short"));
    }

    #[tokio::test]
    async fn test_job_stops_when_target_disappears() {
        let store = store_with_assistant("a1").await;
        let revealer = StreamingRevealer::new();

        revealer.start("a1", "z".repeat(4000), store.clone()).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.replace(Vec::new()).await;

        revealer.wait().await;
        assert!(!revealer.is_active().await);
    }
}
