//! Message types shared between the HTTP surface, the stream aggregator and
//! the thread store.
//!
//! Field names serialize in camelCase because the browser client consumes
//! these shapes directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A source citation attached to an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// An image generated by an upstream provider during a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratedImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A binary attachment supplied by the user or uploaded by a provider.
///
/// `data` carries base64-encoded bytes for outbound uploads; stored messages
/// usually only keep the `url` the provider handed back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One chat message inside a thread.
///
/// While a turn is streaming the assistant message is mutated in place (by
/// id); once `completed` is true it is frozen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<GeneratedImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Tokens-per-second estimate, `content.len() / 4` over elapsed time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tps: Option<f64>,
}

impl Message {
    /// Create a completed user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            citations: Vec::new(),
            images: Vec::new(),
            attachments: Vec::new(),
            completed: true,
            start_time: None,
            end_time: None,
            tps: None,
        }
    }

    /// Create the pending assistant message for an in-flight turn.
    pub fn assistant_pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            content: String::new(),
            citations: Vec::new(),
            images: Vec::new(),
            attachments: Vec::new(),
            completed: false,
            start_time: Some(Utc::now()),
            end_time: None,
            tps: None,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_is_completed() {
        let msg = Message::user("hello");
        assert!(msg.completed);
        assert!(msg.is_user());
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_assistant_pending_records_start_time() {
        let msg = Message::assistant_pending("m1");
        assert!(!msg.completed);
        assert!(msg.start_time.is_some());
        assert!(msg.end_time.is_none());
    }

    #[test]
    fn test_camel_case_serialization() {
        let msg = Message::assistant_pending("m1");
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("startTime").is_some());
        assert!(json.get("start_time").is_none());
    }
}
