//! Thread domain module.
//!
//! This module contains the thread and message domain models and the shared
//! message store for the open thread.
//!
//! # Module Structure
//!
//! - `model`: Thread domain model (`Thread`)
//! - `message`: Message types (`Message`, `MessageRole`, `DeliveryState`)
//! - `store`: Shared message list (`MessageStore`)

mod message;
mod model;
mod store;

// Re-export public API
pub use message::{DeliveryState, Message, MessageRole};
pub use model::Thread;
pub use store::MessageStore;
