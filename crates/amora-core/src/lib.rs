//! Domain layer of the Amora assistant conversation pipeline.
//!
//! This crate holds everything with real state-machine and concurrency
//! concerns: the optimistic-send reconciliation protocol, the incremental
//! reveal of assistant replies, the two-stage permission gate, and the
//! audio/image capture pipelines. Remote and OS collaborators are traits
//! in [`backend`]; HTTP implementations live in `amora-interaction` and the
//! orchestration layer in `amora-application`.

pub mod backend;
pub mod capture;
pub mod error;
pub mod permission;
pub mod reconcile;
pub mod reveal;
pub mod thread;

// Re-export common error type
pub use error::AmoraError;
