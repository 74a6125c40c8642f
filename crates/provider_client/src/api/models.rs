//! Wire models for upstream requests and stream fragments.

use chat_core::{Attachment, Citation, GeneratedImage, Message, Role};
use serde::{Deserialize, Serialize};

/// Chat request body posted to every provider endpoint.
///
/// Provider-specific request shaping is deliberately thin: all upstreams
/// accept this envelope (the relay's edge adapters translate further where a
/// vendor needs it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

impl ChatRequest {
    pub fn new(query: impl Into<String>, model: impl Into<String>, history: &[Message]) -> Self {
        Self {
            query: query.into(),
            model: model.into(),
            messages: history.iter().map(WireMessage::from).collect(),
            attachments: Vec::new(),
            stream: true,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// One newline-delimited JSON fragment from an upstream stream.
///
/// Fragments are sparse: a citations batch, a content delta, an attachment
/// upload notification or a finish marker, in any interleaving. Every field
/// defaults so unrelated provider chatter deserializes to an empty fragment
/// instead of failing the line.
#[derive(Debug, Default, Deserialize)]
pub struct StreamFragment {
    #[serde(default)]
    pub citations: Option<Vec<Citation>>,
    #[serde(default)]
    pub images: Option<Vec<GeneratedImage>>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default, rename = "type")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: StreamDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamFragment {
    /// Fragment marking the attachment-uploaded event.
    pub fn is_attachment_uploaded(&self) -> bool {
        self.event_type.as_deref() == Some("attachment_uploaded") && self.attachment.is_some()
    }

    /// Any choice carrying a finish reason ends the message.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices
            .iter()
            .find_map(|c| c.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_fragment_parses() {
        let fragment: StreamFragment =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#).unwrap();
        assert_eq!(fragment.choices[0].delta.content.as_deref(), Some("Hel"));
        assert!(fragment.finish_reason().is_none());
    }

    #[test]
    fn test_citations_fragment_parses() {
        let fragment: StreamFragment =
            serde_json::from_str(r#"{"citations":[{"url":"https://example.com"}]}"#).unwrap();
        assert_eq!(fragment.citations.unwrap().len(), 1);
    }

    #[test]
    fn test_finish_reason_detected() {
        let fragment: StreamFragment =
            serde_json::from_str(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#).unwrap();
        assert_eq!(fragment.finish_reason(), Some("stop"));
    }

    #[test]
    fn test_attachment_event_detected() {
        let fragment: StreamFragment = serde_json::from_str(
            r#"{"type":"attachment_uploaded","attachment":{"id":"a1","name":"f.png","mimeType":"image/png"}}"#,
        )
        .unwrap();
        assert!(fragment.is_attachment_uploaded());
    }

    #[test]
    fn test_unrelated_fragment_is_empty() {
        let fragment: StreamFragment = serde_json::from_str(r#"{"usage":{"tokens":12}}"#).unwrap();
        assert!(fragment.citations.is_none());
        assert!(fragment.choices.is_empty());
        assert!(!fragment.is_attachment_uploaded());
    }
}
