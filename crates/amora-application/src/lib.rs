//! Application layer for Amora.
//!
//! This crate provides the use case orchestrating the conversation
//! pipeline behind the coaching chat screen, plus the notice queue the
//! presentation layer drains for transient feedback.

pub mod bootstrap;
pub mod notice;
pub mod session_usecase;

pub use bootstrap::{PlatformSeams, build_session};
pub use notice::{Notice, NoticeSeverity, NoticeSink};
pub use session_usecase::ChatSessionUseCase;
