//! Two-stage permission gating.
//!
//! The gate shows an in-app explanatory prompt before the OS-level dialog,
//! so the OS prompt is only issued once the user has already expressed
//! intent. A user who declines the preamble never triggers the OS request,
//! and a status that is already `Denied` is terminal: the gate reports it
//! without re-prompting, because OS dialogs generally cannot be re-shown
//! once denied.

use std::sync::Arc;

use crate::backend::{PermissionBackend, PermissionKind, PermissionStatus, PreamblePrompt};

/// Tracks and requests microphone/camera authorization.
pub struct PermissionGate {
    backend: Arc<dyn PermissionBackend>,
    preamble: Arc<dyn PreamblePrompt>,
}

impl PermissionGate {
    /// Creates a gate over the platform permission surface and the in-app
    /// preamble prompt.
    pub fn new(backend: Arc<dyn PermissionBackend>, preamble: Arc<dyn PreamblePrompt>) -> Self {
        Self { backend, preamble }
    }

    /// Current authorization status without prompting.
    pub async fn check_status(&self, kind: PermissionKind) -> PermissionStatus {
        self.backend.status(kind).await
    }

    /// Requests authorization, going through the in-app preamble first when
    /// the status is still undetermined.
    ///
    /// Returns `Granted` or `Denied`; never `Undetermined`. Declining the
    /// preamble counts as `Denied` without the OS dialog ever appearing.
    pub async fn request_with_preamble(&self, kind: PermissionKind) -> PermissionStatus {
        match self.backend.status(kind).await {
            PermissionStatus::Granted => PermissionStatus::Granted,
            PermissionStatus::Denied => {
                tracing::debug!(kind = kind.label(), "permission already denied, not re-prompting");
                PermissionStatus::Denied
            }
            PermissionStatus::Undetermined => {
                if !self.preamble.confirm(kind).await {
                    tracing::info!(kind = kind.label(), "user declined permission preamble");
                    return PermissionStatus::Denied;
                }

                let verdict = self.backend.request(kind).await;
                tracing::info!(kind = kind.label(), ?verdict, "OS permission request resolved");
                match verdict {
                    PermissionStatus::Granted => PermissionStatus::Granted,
                    // An OS dialog that is dismissed without a decision is
                    // treated as denied for this attempt.
                    PermissionStatus::Denied | PermissionStatus::Undetermined => {
                        PermissionStatus::Denied
                    }
                }
            }
        }
    }
}
