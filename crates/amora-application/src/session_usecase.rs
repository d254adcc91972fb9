//! Chat session use case.
//!
//! `ChatSessionUseCase` is the top-level orchestrator behind the coaching
//! chat screen. It loads the open thread, wires user actions into the
//! reconciler and the attachment pipelines, owns the single active reveal
//! job, and converts every pipeline error into a user-visible notice at
//! this boundary.
//!
//! # Responsibilities
//!
//! - Loading thread identity and history on open
//! - Running the optimistic-send protocol and starting the reveal job
//! - Cancelling the reveal job on new send, thread switch, and teardown
//! - Merging transcription and image commentary into the composer draft
//! - Thread archive/delete with failure-safe semantics
//!
//! # Thread Safety
//!
//! All collaborators are `Arc`-injected or internally synchronized; the
//! use case itself is shared behind `Arc` by the host shell.

use std::sync::Arc;

use tokio::sync::Mutex;

use amora_core::backend::{ChatBackend, ImageSource};
use amora_core::capture::{AudioCapturePipeline, ImageAnalysisPipeline, RecordingState};
use amora_core::error::{AmoraError, Result};
use amora_core::reconcile::MessageReconciler;
use amora_core::reveal::StreamingRevealer;
use amora_core::thread::{MessageStore, Thread};

use crate::notice::{Notice, NoticeSink};

pub struct ChatSessionUseCase {
    /// The managed chat backend
    chat: Arc<dyn ChatBackend>,
    /// Recording -> transcription pipeline
    audio: AudioCapturePipeline,
    /// Image capture -> analysis pipeline
    image: ImageAnalysisPipeline,
    /// The canonical message list for the open thread
    store: MessageStore,
    /// Optimistic-send protocol over the store
    reconciler: MessageReconciler,
    /// The single active reveal job
    revealer: StreamingRevealer,
    /// Queue of transient user-visible notices
    notices: NoticeSink,
    /// The signed-in user's identifier
    user_id: String,
    /// The currently open thread, if any
    open_thread: Mutex<Option<Thread>>,
    /// The composer draft text
    composer: Mutex<String>,
}

impl ChatSessionUseCase {
    /// Creates the use case over the chat backend and the two attachment
    /// pipelines. The message store, reconciler, and revealer are owned
    /// internally.
    pub fn new(
        chat: Arc<dyn ChatBackend>,
        audio: AudioCapturePipeline,
        image: ImageAnalysisPipeline,
        user_id: impl Into<String>,
    ) -> Self {
        let store = MessageStore::new();
        Self {
            chat,
            audio,
            image,
            reconciler: MessageReconciler::new(store.clone()),
            revealer: StreamingRevealer::new(),
            store,
            notices: NoticeSink::new(),
            user_id: user_id.into(),
            open_thread: Mutex::new(None),
            composer: Mutex::new(String::new()),
        }
    }

    /// Handle to the message list consumed by the renderer.
    pub fn messages(&self) -> MessageStore {
        self.store.clone()
    }

    /// Handle to the notice queue consumed by the renderer.
    pub fn notices(&self) -> NoticeSink {
        self.notices.clone()
    }

    /// The currently open thread, if any.
    pub async fn current_thread(&self) -> Option<Thread> {
        self.open_thread.lock().await.clone()
    }

    /// Current composer draft text.
    pub async fn composer(&self) -> String {
        self.composer.lock().await.clone()
    }

    /// Replaces the composer draft text.
    pub async fn set_composer(&self, text: impl Into<String>) {
        *self.composer.lock().await = text.into();
    }

    /// Current recording lifecycle state, for the record button.
    pub async fn recording_state(&self) -> RecordingState {
        self.audio.state().await
    }

    /// Opens a thread: cancels any reveal still running for the previous
    /// one, loads title and history, and resets composer/attachment state.
    pub async fn open(&self, thread_id: &str) -> Result<()> {
        self.revealer.cancel().await;
        self.image.discard().await;

        let thread = self.report(self.chat.get_thread(thread_id).await)?;
        let history = self.report(self.chat.get_messages(thread_id).await)?;

        tracing::info!(thread_id, messages = history.len(), "thread opened");
        self.reconciler.load_history(thread_id, history).await;
        *self.open_thread.lock().await = Some(thread);
        *self.composer.lock().await = String::new();
        Ok(())
    }

    /// Sends a user message through the optimistic protocol.
    ///
    /// On success the confirmed pair replaces the optimistic entry in one
    /// step and the assistant reply starts revealing. On failure the entry
    /// is rolled back and the text is restored into the composer.
    pub async fn send(&self, text: &str) -> Result<()> {
        let thread_id = self.require_thread().await?;
        let pending = self.report(self.reconciler.begin_send(&thread_id, text).await)?;

        // A reveal still running for an older reply stops now; its message
        // keeps the revealed prefix until the list is next replaced.
        self.revealer.cancel().await;

        match self.chat.send_message(&thread_id, &self.user_id, text).await {
            Ok(outcome) => {
                let assistant = self.reconciler.confirm(pending, outcome, true).await;
                self.revealer
                    .start(assistant.id, assistant.content, self.store.clone())
                    .await;
                Ok(())
            }
            Err(err) => {
                let draft = self.reconciler.rollback(pending).await;
                *self.composer.lock().await = draft;
                self.notices.push(Notice::from_error(&err));
                Err(err)
            }
        }
    }

    /// Starts a microphone recording (permission-gated).
    pub async fn start_recording(&self) -> Result<()> {
        self.report(self.audio.start().await)
    }

    /// Stops the recording and merges the transcription into the composer.
    /// A blank recording is a quiet no-op.
    pub async fn stop_recording(&self) -> Result<()> {
        match self.report(self.audio.stop().await)? {
            Some(text) => {
                self.merge_into_composer(&text).await;
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Picks or captures an image, analyzes it, and merges the commentary
    /// into the composer. A cancelled picker is a quiet no-op.
    pub async fn attach_image(&self, source: ImageSource) -> Result<()> {
        let picked = self.report(self.image.capture(source).await)?;
        if picked.is_none() {
            return Ok(());
        }

        let commentary = self.report(self.image.analyze().await)?;
        self.merge_into_composer(&commentary).await;
        Ok(())
    }

    /// Archives the open thread. On success the caller navigates away; on
    /// failure the thread stays open and intact.
    pub async fn archive(&self) -> Result<()> {
        let thread_id = self.require_thread().await?;
        self.report(self.chat.archive_thread(&thread_id).await)?;
        self.revealer.cancel().await;
        Ok(())
    }

    /// Deletes the open thread. Same failure semantics as `archive`.
    pub async fn delete(&self) -> Result<()> {
        let thread_id = self.require_thread().await?;
        self.report(self.chat.delete_thread(&thread_id).await)?;
        self.revealer.cancel().await;
        *self.open_thread.lock().await = None;
        Ok(())
    }

    /// Screen teardown: stops the reveal job where it is.
    pub async fn close(&self) {
        self.revealer.cancel().await;
    }

    async fn require_thread(&self) -> Result<String> {
        let thread = self.open_thread.lock().await;
        thread
            .as_ref()
            .map(|t| t.id.clone())
            .ok_or_else(|| AmoraError::validation("no thread is open"))
    }

    async fn merge_into_composer(&self, text: &str) {
        let mut composer = self.composer.lock().await;
        if composer.is_empty() {
            *composer = text.to_string();
        } else {
            composer.push(' ');
            composer.push_str(text);
        }
    }

    /// Converts an error into a notice at this boundary, passing the
    /// result through unchanged.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::debug!(error = %err, "surfacing notice");
            self.notices.push(Notice::from_error(err));
        }
        result
    }
}
