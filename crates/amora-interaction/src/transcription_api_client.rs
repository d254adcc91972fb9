//! TranscriptionApiClient - clip upload to the transcription endpoint.
//!
//! Packages the recorded clip as a binary body with a language hint and
//! returns the transcribed text. Any non-success response or transport
//! failure becomes `TranscriptionFailed` carrying the upstream message when
//! available. No retry; the caller re-records.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use amora_core::backend::{AudioClip, TranscriptionBackend};
use amora_core::error::{AmoraError, Result};

use crate::chat_api_client::upstream_error;
use crate::config::ApiConfig;

/// REST implementation of [`TranscriptionBackend`].
#[derive(Clone)]
pub struct TranscriptionApiClient {
    client: Client,
    config: ApiConfig,
}

impl TranscriptionApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Builds a client from environment configuration.
    pub fn try_from_env() -> Result<Self> {
        Ok(Self::new(ApiConfig::try_from_env()?))
    }
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    success: bool,
    text: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl TranscriptionBackend for TranscriptionApiClient {
    async fn transcribe(&self, clip: AudioClip) -> Result<String> {
        let url = self.config.endpoint("/transcriptions");
        tracing::debug!(
            uri = %clip.uri,
            duration_ms = clip.duration_ms,
            language = %self.config.language_hint,
            "uploading clip for transcription"
        );

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.auth_token))
            .header("Content-Type", clip.mime_type.clone())
            .query(&[("language", self.config.language_hint.as_str())])
            .body(clip.bytes)
            .send()
            .await
            .map_err(|err| AmoraError::transcription(format!("upload failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "transcription endpoint rejected the clip");
            return Err(AmoraError::transcription(upstream_error(body)));
        }

        let envelope: TranscriptionResponse = response.json().await.map_err(|err| {
            AmoraError::transcription(format!("malformed transcription response: {err}"))
        })?;

        if !envelope.success {
            return Err(AmoraError::transcription(
                envelope
                    .error
                    .unwrap_or_else(|| "transcription rejected".to_string()),
            ));
        }

        envelope
            .text
            .ok_or_else(|| AmoraError::transcription("transcription response missing text"))
    }
}
