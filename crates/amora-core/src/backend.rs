//! Collaborator contracts the pipeline calls into.
//!
//! Everything remote or OS-level is behind a trait here: the managed chat
//! backend, the transcription and vision endpoints, and the platform seams
//! for permissions, microphone capture, and image picking. Implementations
//! live in `amora-interaction` (HTTP) and in the host shell (platform);
//! tests inject mocks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::thread::{MessageRole, Thread};

/// A server-confirmed message record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The pair of confirmed records a successful send produces: the echoed
/// user message and the assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOutcome {
    pub user_message: MessageRecord,
    pub assistant_message: MessageRecord,
}

/// The managed chat backend: thread reads, the send operation, and the
/// thread soft-lifecycle.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fetches a thread's identity/title/archived flag.
    async fn get_thread(&self, thread_id: &str) -> Result<Thread>;

    /// Fetches the ordered message history of a thread.
    async fn get_messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>>;

    /// Sends a user message and returns the confirmed user echo plus the
    /// assistant reply.
    ///
    /// # Errors
    ///
    /// Returns `AmoraError::SendFailed` carrying the upstream reason when
    /// available; the caller rolls back its optimistic entry.
    async fn send_message(&self, thread_id: &str, user_id: &str, text: &str)
    -> Result<SendOutcome>;

    /// Archives a thread. The thread is left intact on failure.
    async fn archive_thread(&self, thread_id: &str) -> Result<()>;

    /// Deletes a thread. The thread is left intact on failure.
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;
}

/// A finished recording handed to transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    /// Local URI of the recorded clip.
    pub uri: String,
    /// Recorded duration in milliseconds.
    pub duration_ms: u64,
    /// Encoded audio payload.
    pub bytes: Vec<u8>,
    /// MIME type of the payload (e.g. `audio/m4a`).
    pub mime_type: String,
}

impl AudioClip {
    /// A zero-duration or byte-less clip is treated as "nothing recorded";
    /// it is discarded without invoking transcription.
    pub fn is_blank(&self) -> bool {
        self.duration_ms == 0 || self.bytes.is_empty()
    }
}

/// The remote transcription endpoint.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Uploads a clip and returns the transcribed text.
    ///
    /// # Errors
    ///
    /// Returns `AmoraError::TranscriptionFailed` on any non-success response
    /// or transport failure. There is no automatic retry.
    async fn transcribe(&self, clip: AudioClip) -> Result<String>;
}

/// A picked or captured image awaiting analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Encoded image payload.
    pub bytes: Vec<u8>,
    /// MIME type of the payload (e.g. `image/jpeg`).
    pub mime_type: String,
}

/// The remote vision endpoint.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Submits an image and returns free-text commentary.
    ///
    /// # Errors
    ///
    /// Returns `AmoraError::AnalysisFailed` on any non-success response or
    /// transport failure.
    async fn analyze(&self, image: &ImageRef) -> Result<String>;
}

/// The kind of hardware permission being gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    Microphone,
    Camera,
}

impl PermissionKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Microphone => "microphone",
            Self::Camera => "camera",
        }
    }
}

/// OS-level authorization status for a permission kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// The OS permission surface: status query plus the one-shot OS dialog.
#[async_trait]
pub trait PermissionBackend: Send + Sync {
    /// Current authorization status without prompting.
    async fn status(&self, kind: PermissionKind) -> PermissionStatus;

    /// Issues the OS-level permission request. OS dialogs generally cannot
    /// be re-triggered once denied, so the gate only calls this from
    /// `Undetermined`.
    async fn request(&self, kind: PermissionKind) -> PermissionStatus;
}

/// The in-app explanatory prompt shown before the OS dialog.
#[async_trait]
pub trait PreamblePrompt: Send + Sync {
    /// Returns true if the user opted in to proceed to the OS dialog.
    async fn confirm(&self, kind: PermissionKind) -> bool;
}

/// A live microphone session. Dropping the handle releases the hardware;
/// `finalize` consumes it, so the microphone is released on every path
/// whether finalization succeeds or not.
pub trait CaptureHandle: Send {
    /// Stops the capture and produces the recorded clip.
    fn finalize(self: Box<Self>) -> Result<AudioClip>;
}

/// The platform audio-capture surface.
#[async_trait]
pub trait AudioCaptureBackend: Send + Sync {
    /// Opens the microphone and starts recording.
    ///
    /// # Errors
    ///
    /// Returns `AmoraError::Capture` if the hardware handle cannot be
    /// allocated.
    async fn open(&self) -> Result<Box<dyn CaptureHandle>>;
}

/// Where an image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Camera,
    Library,
}

/// The platform image picker/camera surface.
#[async_trait]
pub trait ImagePickerBackend: Send + Sync {
    /// Picks or captures an image. `Ok(None)` means the user cancelled.
    async fn pick(&self, source: ImageSource) -> Result<Option<ImageRef>>;
}
