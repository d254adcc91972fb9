//! Remote collaborators for the Amora pipeline.
//!
//! This crate implements `amora-core`'s backend traits against the managed
//! HTTP backend: the chat send/thread API, the transcription upload, and
//! the vision analysis endpoint.

pub mod chat_api_client;
pub mod config;
pub mod transcription_api_client;
pub mod vision_api_client;

pub use chat_api_client::ChatApiClient;
pub use config::ApiConfig;
pub use transcription_api_client::TranscriptionApiClient;
pub use vision_api_client::VisionApiClient;
