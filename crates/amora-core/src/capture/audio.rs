//! Microphone capture lifecycle.
//!
//! The pipeline owns the single recording session slot. The microphone
//! handle is the only exclusive hardware resource in the system; it is
//! acquired on `start` and released on every exit path out of
//! `Recording`/`Stopping`, including finalize failures. No transition is
//! retried automatically; after any error the caller must invoke `start`
//! again.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::{
    AudioCaptureBackend, CaptureHandle, PermissionKind, PermissionStatus, TranscriptionBackend,
};
use crate::error::{AmoraError, Result};
use crate::permission::PermissionGate;

/// Lifecycle state of the recording session.
///
/// `Idle → AwaitingPermission → Recording → Stopping → Transcribing → Idle`;
/// any state falls back to `Idle` on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    AwaitingPermission,
    Recording,
    Stopping,
    Transcribing,
}

#[derive(Default)]
struct RecordingSession {
    state: Option<RecordingState>,
    handle: Option<Box<dyn CaptureHandle>>,
    started_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    fn state(&self) -> RecordingState {
        self.state.unwrap_or(RecordingState::Idle)
    }

    /// Drops the handle (releasing the microphone) and returns to idle.
    fn reset(&mut self) {
        self.state = None;
        self.handle = None;
        self.started_at = None;
    }
}

/// Owns the recording lifecycle and hands finished clips to transcription.
pub struct AudioCapturePipeline {
    gate: Arc<PermissionGate>,
    capture: Arc<dyn AudioCaptureBackend>,
    transcription: Arc<dyn TranscriptionBackend>,
    session: Mutex<RecordingSession>,
}

impl AudioCapturePipeline {
    pub fn new(
        gate: Arc<PermissionGate>,
        capture: Arc<dyn AudioCaptureBackend>,
        transcription: Arc<dyn TranscriptionBackend>,
    ) -> Self {
        Self {
            gate,
            capture,
            transcription,
            session: Mutex::new(RecordingSession::default()),
        }
    }

    /// Current lifecycle state, for callers and observers.
    pub async fn state(&self) -> RecordingState {
        self.session.lock().await.state()
    }

    /// When the current recording started, if one is in progress. The UI
    /// derives the elapsed-time display from this.
    pub async fn recording_since(&self) -> Option<DateTime<Utc>> {
        self.session.lock().await.started_at
    }

    /// Starts a recording: permission gate, then handle allocation.
    ///
    /// # Errors
    ///
    /// - `Validation` (busy) if a session is already non-idle; no second
    ///   handle is allocated
    /// - `PermissionDenied` if the microphone permission is not granted
    /// - `Capture` if the hardware handle cannot be allocated
    pub async fn start(&self) -> Result<()> {
        // Claim the slot before awaiting anything. The lock is never held
        // across the gate or the handle allocation; the non-idle state is
        // what keeps concurrent `start` calls out while a dialog is open.
        {
            let mut session = self.session.lock().await;
            if session.state() != RecordingState::Idle {
                return Err(AmoraError::busy("recording"));
            }
            session.state = Some(RecordingState::AwaitingPermission);
        }

        let verdict = self
            .gate
            .request_with_preamble(PermissionKind::Microphone)
            .await;
        if verdict != PermissionStatus::Granted {
            self.session.lock().await.reset();
            return Err(AmoraError::permission_denied(
                PermissionKind::Microphone.label(),
            ));
        }

        match self.capture.open().await {
            Ok(handle) => {
                let mut session = self.session.lock().await;
                session.state = Some(RecordingState::Recording);
                session.handle = Some(handle);
                session.started_at = Some(Utc::now());
                tracing::info!("recording started");
                Ok(())
            }
            Err(err) => {
                self.session.lock().await.reset();
                tracing::error!(error = %err, "microphone handle allocation failed");
                Err(err)
            }
        }
    }

    /// Stops the recording, finalizes the clip, and transcribes it.
    ///
    /// Returns `Ok(None)` when the recording produced no usable clip
    /// (zero duration or empty payload); transcription is not invoked.
    /// The capture handle is released on every path.
    ///
    /// # Errors
    ///
    /// - `Validation` if no recording is in progress
    /// - `Capture` if finalization fails
    /// - `TranscriptionFailed` if the upload fails
    pub async fn stop(&self) -> Result<Option<String>> {
        let handle = {
            let mut session = self.session.lock().await;
            if session.state() != RecordingState::Recording {
                return Err(AmoraError::validation("no recording in progress"));
            }

            session.state = Some(RecordingState::Stopping);
            // Taking the handle out means it is dropped (and the microphone
            // released) no matter how finalization goes.
            match session.handle.take() {
                Some(handle) => handle,
                None => {
                    session.reset();
                    return Err(AmoraError::internal("recording session lost its handle"));
                }
            }
        };

        let clip = match handle.finalize() {
            Ok(clip) => clip,
            Err(err) => {
                self.session.lock().await.reset();
                tracing::error!(error = %err, "recording finalization failed");
                return Err(err);
            }
        };

        if clip.is_blank() {
            self.session.lock().await.reset();
            tracing::debug!("blank recording discarded");
            return Ok(None);
        }

        self.session.lock().await.state = Some(RecordingState::Transcribing);
        tracing::info!(duration_ms = clip.duration_ms, "transcribing recorded clip");
        // The slot stays in `Transcribing` for the duration of the upload,
        // so `state()` answers immediately and `start` is rejected as busy.
        let result = self.transcription.transcribe(clip).await;
        self.session.lock().await.reset();

        match result {
            Ok(text) => Ok(Some(text)),
            Err(err) => {
                tracing::warn!(error = %err, "transcription failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AudioClip, PermissionBackend, PreamblePrompt};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct GrantAll;

    #[async_trait]
    impl PermissionBackend for GrantAll {
        async fn status(&self, _kind: PermissionKind) -> PermissionStatus {
            PermissionStatus::Granted
        }
        async fn request(&self, _kind: PermissionKind) -> PermissionStatus {
            PermissionStatus::Granted
        }
    }

    struct DenyAll;

    #[async_trait]
    impl PermissionBackend for DenyAll {
        async fn status(&self, _kind: PermissionKind) -> PermissionStatus {
            PermissionStatus::Denied
        }
        async fn request(&self, _kind: PermissionKind) -> PermissionStatus {
            PermissionStatus::Denied
        }
    }

    struct AutoAccept;

    #[async_trait]
    impl PreamblePrompt for AutoAccept {
        async fn confirm(&self, _kind: PermissionKind) -> bool {
            true
        }
    }

    fn clip(duration_ms: u64, bytes: &[u8]) -> AudioClip {
        AudioClip {
            uri: "file:///tmp/clip.m4a".to_string(),
            duration_ms,
            bytes: bytes.to_vec(),
            mime_type: "audio/m4a".to_string(),
        }
    }

    struct MockHandle {
        result: Result<AudioClip>,
    }

    impl CaptureHandle for MockHandle {
        fn finalize(self: Box<Self>) -> Result<AudioClip> {
            self.result
        }
    }

    struct MockCaptureBackend {
        open_count: AtomicUsize,
        fail_open: bool,
        finalize_result: StdMutex<Option<Result<AudioClip>>>,
    }

    impl MockCaptureBackend {
        fn producing(clip: AudioClip) -> Self {
            Self {
                open_count: AtomicUsize::new(0),
                fail_open: false,
                finalize_result: StdMutex::new(Some(Ok(clip))),
            }
        }

        fn failing_open() -> Self {
            Self {
                open_count: AtomicUsize::new(0),
                fail_open: true,
                finalize_result: StdMutex::new(None),
            }
        }

        fn failing_finalize() -> Self {
            Self {
                open_count: AtomicUsize::new(0),
                fail_open: false,
                finalize_result: StdMutex::new(Some(Err(AmoraError::capture("encoder crashed")))),
            }
        }

        fn opens(&self) -> usize {
            self.open_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AudioCaptureBackend for MockCaptureBackend {
        async fn open(&self) -> Result<Box<dyn CaptureHandle>> {
            if self.fail_open {
                return Err(AmoraError::capture("microphone unavailable"));
            }
            self.open_count.fetch_add(1, Ordering::SeqCst);
            let result = self
                .finalize_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(clip(0, &[])));
            Ok(Box::new(MockHandle { result }))
        }
    }

    struct MockTranscription {
        calls: AtomicUsize,
        result: Result<String>,
    }

    impl MockTranscription {
        fn ok(text: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(text.to_string()),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(AmoraError::transcription("upstream rejected the clip")),
            }
        }
    }

    #[async_trait]
    impl TranscriptionBackend for MockTranscription {
        async fn transcribe(&self, _clip: AudioClip) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    /// Holds the upload until `release` is notified.
    struct BlockedTranscription {
        release: Arc<tokio::sync::Notify>,
        text: String,
    }

    #[async_trait]
    impl TranscriptionBackend for BlockedTranscription {
        async fn transcribe(&self, _clip: AudioClip) -> Result<String> {
            self.release.notified().await;
            Ok(self.text.clone())
        }
    }

    fn granted_gate() -> Arc<PermissionGate> {
        Arc::new(PermissionGate::new(Arc::new(GrantAll), Arc::new(AutoAccept)))
    }

    fn denied_gate() -> Arc<PermissionGate> {
        Arc::new(PermissionGate::new(Arc::new(DenyAll), Arc::new(AutoAccept)))
    }

    #[tokio::test]
    async fn test_start_stop_transcribe_roundtrip() {
        let capture = Arc::new(MockCaptureBackend::producing(clip(1800, b"pcm")));
        let transcription = Arc::new(MockTranscription::ok("hello there"));
        let pipeline =
            AudioCapturePipeline::new(granted_gate(), capture.clone(), transcription.clone());

        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state().await, RecordingState::Recording);
        assert!(pipeline.recording_since().await.is_some());

        let text = pipeline.stop().await.unwrap();
        assert_eq!(text.as_deref(), Some("hello there"));
        assert_eq!(pipeline.state().await, RecordingState::Idle);
        assert!(pipeline.recording_since().await.is_none());
        assert_eq!(transcription.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_start_while_recording_is_busy_and_allocates_no_handle() {
        let capture = Arc::new(MockCaptureBackend::producing(clip(500, b"pcm")));
        let pipeline = AudioCapturePipeline::new(
            granted_gate(),
            capture.clone(),
            Arc::new(MockTranscription::ok("x")),
        );

        pipeline.start().await.unwrap();
        let err = pipeline.start().await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(capture.opens(), 1);
        assert_eq!(pipeline.state().await, RecordingState::Recording);
    }

    #[tokio::test]
    async fn test_permission_denied_returns_to_idle() {
        let capture = Arc::new(MockCaptureBackend::producing(clip(500, b"pcm")));
        let pipeline = AudioCapturePipeline::new(
            denied_gate(),
            capture.clone(),
            Arc::new(MockTranscription::ok("x")),
        );

        let err = pipeline.start().await.unwrap_err();
        assert!(err.is_permission_denied());
        assert_eq!(pipeline.state().await, RecordingState::Idle);
        assert_eq!(capture.opens(), 0);
    }

    #[tokio::test]
    async fn test_open_failure_returns_to_idle() {
        let pipeline = AudioCapturePipeline::new(
            granted_gate(),
            Arc::new(MockCaptureBackend::failing_open()),
            Arc::new(MockTranscription::ok("x")),
        );

        let err = pipeline.start().await.unwrap_err();
        assert!(err.is_capture());
        assert_eq!(pipeline.state().await, RecordingState::Idle);
    }

    #[tokio::test]
    async fn test_stop_without_recording_is_rejected() {
        let pipeline = AudioCapturePipeline::new(
            granted_gate(),
            Arc::new(MockCaptureBackend::producing(clip(500, b"pcm"))),
            Arc::new(MockTranscription::ok("x")),
        );

        let err = pipeline.stop().await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_blank_clip_skips_transcription() {
        let transcription = Arc::new(MockTranscription::ok("should not run"));
        let pipeline = AudioCapturePipeline::new(
            granted_gate(),
            Arc::new(MockCaptureBackend::producing(clip(0, &[]))),
            transcription.clone(),
        );

        pipeline.start().await.unwrap();
        let text = pipeline.stop().await.unwrap();

        assert!(text.is_none());
        assert_eq!(transcription.calls.load(Ordering::SeqCst), 0);
        assert_eq!(pipeline.state().await, RecordingState::Idle);
    }

    #[tokio::test]
    async fn test_finalize_failure_releases_and_idles() {
        let transcription = Arc::new(MockTranscription::ok("should not run"));
        let pipeline = AudioCapturePipeline::new(
            granted_gate(),
            Arc::new(MockCaptureBackend::failing_finalize()),
            transcription.clone(),
        );

        pipeline.start().await.unwrap();
        let err = pipeline.stop().await.unwrap_err();

        assert!(err.is_capture());
        assert_eq!(pipeline.state().await, RecordingState::Idle);
        assert_eq!(transcription.calls.load(Ordering::SeqCst), 0);

        // A fresh start is possible after the failure.
        pipeline.start().await.unwrap();
        assert_eq!(pipeline.state().await, RecordingState::Recording);
    }

    #[tokio::test]
    async fn test_start_during_transcription_is_busy_and_state_stays_live() {
        let release = Arc::new(tokio::sync::Notify::new());
        let transcription = Arc::new(BlockedTranscription {
            release: release.clone(),
            text: "took a while".to_string(),
        });
        let capture = Arc::new(MockCaptureBackend::producing(clip(1200, b"pcm")));
        let pipeline = Arc::new(AudioCapturePipeline::new(
            granted_gate(),
            capture.clone(),
            transcription,
        ));

        pipeline.start().await.unwrap();
        let stopper = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.stop().await }
        });

        // `state()` must answer while the upload is in flight.
        while pipeline.state().await != RecordingState::Transcribing {
            tokio::task::yield_now().await;
        }

        let err = pipeline.start().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(capture.opens(), 1);

        release.notify_one();
        let text = stopper.await.unwrap().unwrap();
        assert_eq!(text.as_deref(), Some("took a while"));
        assert_eq!(pipeline.state().await, RecordingState::Idle);
    }

    #[tokio::test]
    async fn test_transcription_failure_converges_to_idle() {
        let pipeline = AudioCapturePipeline::new(
            granted_gate(),
            Arc::new(MockCaptureBackend::producing(clip(900, b"pcm"))),
            Arc::new(MockTranscription::failing()),
        );

        pipeline.start().await.unwrap();
        let err = pipeline.stop().await.unwrap_err();

        assert!(matches!(err, AmoraError::TranscriptionFailed(_)));
        assert_eq!(pipeline.state().await, RecordingState::Idle);
    }
}
