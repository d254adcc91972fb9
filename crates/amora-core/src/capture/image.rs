//! Image capture and remote analysis.
//!
//! The pipeline owns the single attachment-draft slot: one picked or
//! captured image may be awaiting analysis at a time, and starting another
//! capture while the slot is occupied is rejected. The slot is explicit
//! acquire/release state rather than an artifact of UI invocation order,
//! so the guarantee holds headless too.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::backend::{
    ImagePickerBackend, ImageRef, ImageSource, PermissionKind, PermissionStatus, VisionBackend,
};
use crate::error::{AmoraError, Result};
use crate::permission::PermissionGate;

/// A transient, not-yet-analyzed image. Its lifetime ends when analysis
/// produces composer text or the flow is abandoned.
#[derive(Debug, Clone)]
pub struct AttachmentDraft {
    pub image: ImageRef,
    pub created_at: DateTime<Utc>,
}

/// Owns image selection/capture and submission to the vision endpoint.
pub struct ImageAnalysisPipeline {
    gate: Arc<PermissionGate>,
    picker: Arc<dyn ImagePickerBackend>,
    vision: Arc<dyn VisionBackend>,
    draft: Mutex<Option<AttachmentDraft>>,
}

impl ImageAnalysisPipeline {
    pub fn new(
        gate: Arc<PermissionGate>,
        picker: Arc<dyn ImagePickerBackend>,
        vision: Arc<dyn VisionBackend>,
    ) -> Self {
        Self {
            gate,
            picker,
            vision,
            draft: Mutex::new(None),
        }
    }

    /// Returns true while a draft is held and not yet analyzed.
    pub async fn has_draft(&self) -> bool {
        self.draft.lock().await.is_some()
    }

    /// Picks or captures an image and holds it as the attachment draft.
    ///
    /// `Camera` goes through the permission gate exactly like audio capture;
    /// `Library` does not. Returns `Ok(None)` when the user cancels the
    /// picker, releasing the slot.
    ///
    /// # Errors
    ///
    /// - `Validation` (busy) if a draft is already in flight
    /// - `PermissionDenied` for a camera capture without authorization
    pub async fn capture(&self, source: ImageSource) -> Result<Option<ImageRef>> {
        let mut draft = self.draft.lock().await;
        if draft.is_some() {
            return Err(AmoraError::busy("image attachment"));
        }

        if source == ImageSource::Camera {
            let verdict = self.gate.request_with_preamble(PermissionKind::Camera).await;
            if verdict != PermissionStatus::Granted {
                return Err(AmoraError::permission_denied(PermissionKind::Camera.label()));
            }
        }

        match self.picker.pick(source).await? {
            Some(image) => {
                tracing::debug!(?source, bytes = image.bytes.len(), "image attached as draft");
                *draft = Some(AttachmentDraft {
                    image: image.clone(),
                    created_at: Utc::now(),
                });
                Ok(Some(image))
            }
            None => {
                tracing::debug!(?source, "image picker cancelled");
                Ok(None)
            }
        }
    }

    /// Submits the held draft to the vision endpoint and returns its
    /// commentary. The slot stays occupied for the duration of the call,
    /// so a new `capture` is rejected as busy until this flow resolves;
    /// it is released once the call returns, success or failure. The
    /// caller injects the text into the composer, never auto-sending.
    ///
    /// # Errors
    ///
    /// - `Validation` if no draft is held
    /// - `AnalysisFailed` if the endpoint rejects or the transport fails
    pub async fn analyze(&self) -> Result<String> {
        let image = self
            .draft
            .lock()
            .await
            .as_ref()
            .map(|draft| draft.image.clone())
            .ok_or_else(|| AmoraError::validation("no image attached"))?;

        let result = self.vision.analyze(&image).await;
        if let Err(err) = &result {
            tracing::warn!(error = %err, "image analysis failed");
        }
        *self.draft.lock().await = None;
        result
    }

    /// Abandons the held draft, if any.
    pub async fn discard(&self) {
        *self.draft.lock().await = None;
    }
}
