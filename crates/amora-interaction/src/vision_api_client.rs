//! VisionApiClient - image submission to the remote vision endpoint.
//!
//! Encodes the image inline as base64 alongside a fixed task prompt and
//! returns the endpoint's free-text commentary. The commentary lands in
//! the composer; it is never auto-sent.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use amora_core::backend::{ImageRef, VisionBackend};
use amora_core::error::{AmoraError, Result};

use crate::chat_api_client::upstream_error;
use crate::config::ApiConfig;

/// The one task the vision endpoint performs for the coaching chat.
const TASK_PROMPT: &str = "Review this photo from a dating profile. Describe what stands out, \
what it signals, and suggest one specific conversation opener based on it.";

/// REST implementation of [`VisionBackend`].
#[derive(Clone)]
pub struct VisionApiClient {
    client: Client,
    config: ApiConfig,
}

impl VisionApiClient {
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

#[derive(Serialize)]
struct AnalyzeRequest {
    image: String,
    mime_type: String,
    prompt: &'static str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    success: bool,
    analysis: Option<String>,
    error: Option<String>,
}

#[async_trait]
impl VisionBackend for VisionApiClient {
    async fn analyze(&self, image: &ImageRef) -> Result<String> {
        let url = self.config.endpoint("/vision/analyze");
        let request = AnalyzeRequest {
            image: BASE64_STANDARD.encode(&image.bytes),
            mime_type: image.mime_type.clone(),
            prompt: TASK_PROMPT,
        };

        tracing::debug!(bytes = image.bytes.len(), mime = %image.mime_type, "submitting image for analysis");
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.config.auth_token))
            .json(&request)
            .send()
            .await
            .map_err(|err| AmoraError::analysis(format!("upload failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "vision endpoint rejected the image");
            return Err(AmoraError::analysis(upstream_error(body)));
        }

        let envelope: AnalyzeResponse = response.json().await.map_err(|err| {
            AmoraError::analysis(format!("malformed analysis response: {err}"))
        })?;

        if !envelope.success {
            return Err(AmoraError::analysis(
                envelope
                    .error
                    .unwrap_or_else(|| "analysis rejected".to_string()),
            ));
        }

        envelope
            .analysis
            .ok_or_else(|| AmoraError::analysis("analysis response missing text"))
    }
}
