//! chat_core - Core types and configuration for the chat relay
//!
//! This crate provides the foundational types used across all relay crates:
//! - `message` - Message, Citation, Attachment, GeneratedImage
//! - `thread` - Thread and ThreadSummary persistence shapes
//! - `models` - the static model-capability table
//! - `config` - runtime configuration (file + environment)
//! - `session` - session cookie verification helpers

pub mod config;
pub mod message;
pub mod models;
pub mod session;
pub mod thread;

// Re-export commonly used types
pub use config::{Config, ProxyAuth};
pub use message::{Attachment, Citation, GeneratedImage, Message, Role};
pub use models::{lookup_model, ModelInfo, ProviderKind, DEFAULT_PROVIDER};
pub use thread::{Thread, ThreadSummary};
