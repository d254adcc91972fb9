//! Composition root for a chat session.
//!
//! The host shell supplies the platform seams (permissions, microphone,
//! image picker); everything remote is built here from one [`ApiConfig`].

use std::sync::Arc;

use amora_core::backend::{
    AudioCaptureBackend, ImagePickerBackend, PermissionBackend, PreamblePrompt,
};
use amora_core::capture::{AudioCapturePipeline, ImageAnalysisPipeline};
use amora_core::permission::PermissionGate;
use amora_interaction::{ApiConfig, ChatApiClient, TranscriptionApiClient, VisionApiClient};

use crate::session_usecase::ChatSessionUseCase;

/// The platform seams the host shell must provide.
pub struct PlatformSeams {
    pub permissions: Arc<dyn PermissionBackend>,
    pub preamble: Arc<dyn PreamblePrompt>,
    pub microphone: Arc<dyn AudioCaptureBackend>,
    pub image_picker: Arc<dyn ImagePickerBackend>,
}

/// Builds a fully wired [`ChatSessionUseCase`] over the managed backend.
pub fn build_session(config: ApiConfig, seams: PlatformSeams) -> ChatSessionUseCase {
    let gate = Arc::new(PermissionGate::new(seams.permissions, seams.preamble));

    let chat = Arc::new(ChatApiClient::new(config.clone()));
    let transcription = Arc::new(TranscriptionApiClient::new(config.clone()));
    let vision = Arc::new(VisionApiClient::new(config.clone()));

    let audio = AudioCapturePipeline::new(gate.clone(), seams.microphone, transcription);
    let image = ImageAnalysisPipeline::new(gate, seams.image_picker, vision);

    let user_id = config.user_id.clone();
    tracing::info!(user_id = %user_id, "chat session wired");
    ChatSessionUseCase::new(chat, audio, image, user_id)
}
