//! ChatApiClient - REST client for the managed chat backend.
//!
//! Implements the core's `ChatBackend` contract: thread reads, the send
//! operation (user echo + assistant reply), and the thread soft-lifecycle.
//! The mutating endpoints answer with the backend's
//! `{ success, data | error }` envelope; the reads return bare JSON bodies.
//! Non-success responses surface the upstream `error` string when the body
//! carries one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use amora_core::backend::{ChatBackend, MessageRecord, SendOutcome};
use amora_core::error::{AmoraError, Result};
use amora_core::thread::{MessageRole, Thread};

use crate::config::ApiConfig;

/// REST implementation of [`ChatBackend`].
#[derive(Clone)]
pub struct ChatApiClient {
    client: Client,
    config: ApiConfig,
}

impl ChatApiClient {
    /// Creates a client over the given configuration.
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

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.auth_token)
    }
}

/// Extracts the upstream error string from a non-success response body,
/// falling back to the raw text.
pub(crate) fn upstream_error(body_text: String) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: Option<String>,
    }

    match serde_json::from_str::<ErrorEnvelope>(&body_text) {
        Ok(ErrorEnvelope { error: Some(error) }) => error,
        _ => body_text,
    }
}

#[async_trait]
impl ChatBackend for ChatApiClient {
    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        let url = self.config.endpoint(&format!("/threads/{thread_id}"));
        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|err| AmoraError::internal(format!("thread fetch failed: {err}")))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmoraError::internal(format!(
                "thread fetch failed: {}",
                upstream_error(body)
            )));
        }

        let dto: ThreadDto = response
            .json()
            .await
            .map_err(|err| AmoraError::internal(format!("failed to parse thread: {err}")))?;
        Ok(dto.into_thread())
    }

    async fn get_messages(&self, thread_id: &str) -> Result<Vec<MessageRecord>> {
        let url = self.config.endpoint(&format!("/threads/{thread_id}/messages"));
        let response = self
            .client
            .get(url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|err| AmoraError::internal(format!("history fetch failed: {err}")))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmoraError::internal(format!(
                "history fetch failed: {}",
                upstream_error(body)
            )));
        }

        let dtos: Vec<MessageDto> = response
            .json()
            .await
            .map_err(|err| AmoraError::internal(format!("failed to parse history: {err}")))?;
        dtos.into_iter().map(MessageDto::into_record).collect()
    }

    async fn send_message(
        &self,
        thread_id: &str,
        user_id: &str,
        text: &str,
    ) -> Result<SendOutcome> {
        let url = self.config.endpoint(&format!("/threads/{thread_id}/messages"));
        let request = SendRequest {
            user_id: user_id.to_string(),
            text: text.to_string(),
        };

        tracing::debug!(thread_id, "sending message");
        let response = self
            .client
            .post(url)
            .header("Authorization", self.bearer())
            .json(&request)
            .send()
            .await
            .map_err(|err| AmoraError::send_failed(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(thread_id, %status, "send rejected by backend");
            return Err(AmoraError::send_failed(upstream_error(body)));
        }

        let envelope: SendResponse = response
            .json()
            .await
            .map_err(|err| AmoraError::send_failed(format!("malformed send response: {err}")))?;

        if !envelope.success {
            return Err(AmoraError::SendFailed {
                reason: envelope.error,
            });
        }

        let data = envelope.data.ok_or_else(|| {
            AmoraError::send_failed("send response missing message data")
        })?;

        // Field position fixes the roles in the send envelope, whether or
        // not the records carry them explicitly.
        let mut user_message = data.user_message.into_record()?;
        user_message.role = MessageRole::User;
        let mut assistant_message = data.assistant_message.into_record()?;
        assistant_message.role = MessageRole::Assistant;

        Ok(SendOutcome {
            user_message,
            assistant_message,
        })
    }

    async fn archive_thread(&self, thread_id: &str) -> Result<()> {
        let url = self.config.endpoint(&format!("/threads/{thread_id}/archive"));
        let response = self
            .client
            .post(url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|err| AmoraError::thread_action("archive", err.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmoraError::thread_action("archive", upstream_error(body)));
        }
        tracing::info!(thread_id, "thread archived");
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let url = self.config.endpoint(&format!("/threads/{thread_id}"));
        let response = self
            .client
            .delete(url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|err| AmoraError::thread_action("delete", err.to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AmoraError::thread_action("delete", upstream_error(body)));
        }
        tracing::info!(thread_id, "thread deleted");
        Ok(())
    }
}

#[derive(Serialize)]
struct SendRequest {
    user_id: String,
    text: String,
}

#[derive(Deserialize)]
struct SendResponse {
    success: bool,
    data: Option<SendData>,
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendData {
    user_message: MessageDto,
    assistant_message: MessageDto,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadDto {
    id: String,
    title: String,
    #[serde(default)]
    archived: bool,
    owner_id: String,
}

impl ThreadDto {
    fn into_thread(self) -> Thread {
        Thread {
            id: self.id,
            title: self.title,
            archived: self.archived,
            owner_id: self.owner_id,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageDto {
    id: String,
    #[serde(default)]
    role: Option<String>,
    content: String,
    created_at: DateTime<Utc>,
}

impl MessageDto {
    fn into_record(self) -> Result<MessageRecord> {
        let role = match self.role.as_deref() {
            Some("assistant") => MessageRole::Assistant,
            // The send envelope may omit roles; `send_message` overrides
            // them by field position. History rows carry them explicitly.
            Some("user") | None => MessageRole::User,
            Some(other) => {
                return Err(AmoraError::internal(format!("unknown message role: {other}")));
            }
        };
        Ok(MessageRecord {
            id: self.id,
            role,
            content: self.content,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_prefers_envelope_field() {
        let body = r#"{"success":false,"error":"thread is archived"}"#.to_string();
        assert_eq!(upstream_error(body), "thread is archived");
    }

    #[test]
    fn test_upstream_error_falls_back_to_raw_body() {
        assert_eq!(upstream_error("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn test_send_response_parses_envelope() {
        let json = r#"{
            "success": true,
            "data": {
                "userMessage": {"id": "u9", "role": "user", "content": "hi", "createdAt": "2026-08-29T10:00:00Z"},
                "assistantMessage": {"id": "a9", "role": "assistant", "content": "hello", "createdAt": "2026-08-29T10:00:01Z"}
            },
            "error": null
        }"#;

        let envelope: SendResponse = serde_json::from_str(json).unwrap();
        assert!(envelope.success);
        let data = envelope.data.unwrap();
        assert_eq!(data.user_message.id, "u9");
        let assistant = data.assistant_message.into_record().unwrap();
        assert_eq!(assistant.role, MessageRole::Assistant);
    }

    #[test]
    fn test_message_dto_rejects_unknown_role() {
        let dto = MessageDto {
            id: "m1".to_string(),
            role: Some("moderator".to_string()),
            content: "x".to_string(),
            created_at: Utc::now(),
        };
        assert!(dto.into_record().is_err());
    }
}
