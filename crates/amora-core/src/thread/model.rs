//! Thread domain model.
//!
//! A thread is a single conversation between a user and the assistant.
//! Threads are created externally (onboarding/profile flow); the pipeline
//! reads them and soft-mutates them (archive/delete) only.

use serde::{Deserialize, Serialize};

/// A conversation thread as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Unique thread identifier
    pub id: String,
    /// Human-readable thread title
    pub title: String,
    /// Whether the thread has been archived
    #[serde(default)]
    pub archived: bool,
    /// The owning user's identifier
    pub owner_id: String,
}
