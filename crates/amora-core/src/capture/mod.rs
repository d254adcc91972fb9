//! Attachment capture pipelines.
//!
//! - `audio`: microphone recording lifecycle feeding transcription
//! - `image`: image selection/capture feeding remote analysis
//!
//! Each pipeline owns its single in-flight slot (the recording session and
//! the attachment draft); only one of each may exist at a time.

pub mod audio;
pub mod image;

pub use audio::{AudioCapturePipeline, RecordingState};
pub use image::{AttachmentDraft, ImageAnalysisPipeline};
