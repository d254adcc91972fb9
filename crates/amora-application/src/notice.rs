//! Transient user-visible notices.
//!
//! Every error that reaches the use-case boundary is converted into a
//! lightweight, auto-dismissing notice for the presentation layer; nothing
//! crashes the screen. The sink is a drain-style queue the renderer polls.

use std::sync::{Arc, Mutex};

use amora_core::AmoraError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Info,
    Error,
}

/// A transient notice naming a failure (or outcome) in plain language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            text: text.into(),
        }
    }

    /// Converts a pipeline error into its user-facing wording.
    pub fn from_error(err: &AmoraError) -> Self {
        match err {
            AmoraError::Validation(message) => Self::info(message.clone()),
            AmoraError::PermissionDenied { kind } => Self::error(format!(
                "Enable {kind} access in Settings to use this feature."
            )),
            AmoraError::Capture(_) => Self::error("Recording didn't work. Try again."),
            AmoraError::TranscriptionFailed(_) => {
                Self::error("Couldn't transcribe your recording.")
            }
            AmoraError::AnalysisFailed(_) => Self::error("Couldn't analyze that photo."),
            AmoraError::SendFailed { reason } => match reason {
                Some(reason) => Self::error(format!("Message not sent: {reason}")),
                None => Self::error("Message not sent. Check your connection."),
            },
            AmoraError::ThreadActionFailed { action, .. } => {
                Self::error(format!("Couldn't {action} this conversation."))
            }
            AmoraError::Config(_)
            | AmoraError::Io { .. }
            | AmoraError::Serialization { .. }
            | AmoraError::Internal(_) => Self::error("Something went wrong. Please try again."),
        }
    }
}

/// Clonable queue of notices awaiting display.
#[derive(Clone, Default)]
pub struct NoticeSink {
    inner: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).push(notice);
    }

    /// Takes all queued notices, leaving the queue empty.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(|e| e.into_inner()))
    }
}
