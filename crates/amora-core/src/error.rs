//! Error types for the Amora conversation pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the Amora pipeline.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. Every variant is handled at
/// the use-case boundary, where it is converted to a user-visible notice.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AmoraError {
    /// Invalid input or a rejected operation (empty text, busy pipeline)
    #[error("Validation error: {0}")]
    Validation(String),

    /// The user denied a microphone/camera permission, or declined the
    /// in-app preamble before the OS dialog was shown
    #[error("Permission denied: {kind}")]
    PermissionDenied { kind: String },

    /// Microphone capture failure (handle allocation or finalization)
    #[error("Capture error: {0}")]
    Capture(String),

    /// The transcription endpoint rejected or failed on a clip upload
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// The vision endpoint rejected or failed on an image submission
    #[error("Image analysis failed: {0}")]
    AnalysisFailed(String),

    /// The remote send operation failed; the optimistic message is rolled back
    #[error("Send failed{}", .reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default())]
    SendFailed { reason: Option<String> },

    /// Archive/delete of a thread failed; the thread is left intact
    #[error("Thread action failed: {action} - {message}")]
    ThreadActionFailed { action: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AmoraError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Validation error for an operation rejected because another
    /// one is still in flight
    pub fn busy(what: &str) -> Self {
        Self::Validation(format!("{what} already in progress"))
    }

    /// Creates a PermissionDenied error
    pub fn permission_denied(kind: impl Into<String>) -> Self {
        Self::PermissionDenied { kind: kind.into() }
    }

    /// Creates a Capture error
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Creates a TranscriptionFailed error
    pub fn transcription(message: impl Into<String>) -> Self {
        Self::TranscriptionFailed(message.into())
    }

    /// Creates an AnalysisFailed error
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::AnalysisFailed(message.into())
    }

    /// Creates a SendFailed error with an upstream reason
    pub fn send_failed(reason: impl Into<String>) -> Self {
        Self::SendFailed {
            reason: Some(reason.into()),
        }
    }

    /// Creates a ThreadActionFailed error
    pub fn thread_action(action: &str, message: impl Into<String>) -> Self {
        Self::ThreadActionFailed {
            action: action.to_string(),
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a PermissionDenied error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Check if this is a Capture error
    pub fn is_capture(&self) -> bool {
        matches!(self, Self::Capture(_))
    }

    /// Check if this is a SendFailed error
    pub fn is_send_failed(&self) -> bool {
        matches!(self, Self::SendFailed { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AmoraError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AmoraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, AmoraError>`.
pub type Result<T> = std::result::Result<T, AmoraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_failed_display_with_reason() {
        let err = AmoraError::send_failed("upstream unavailable");
        assert_eq!(err.to_string(), "Send failed: upstream unavailable");
    }

    #[test]
    fn test_send_failed_display_without_reason() {
        let err = AmoraError::SendFailed { reason: None };
        assert_eq!(err.to_string(), "Send failed");
    }

    #[test]
    fn test_busy_is_validation() {
        assert!(AmoraError::busy("recording").is_validation());
    }
}
