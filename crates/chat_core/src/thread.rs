//! Thread persistence shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Maximum length of an auto-derived thread title.
pub const MAX_TITLE_LEN: usize = 50;

/// A conversation thread owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight entry kept in the per-user recency list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }

    /// Derive a title from the first user message when none was supplied.
    pub fn derive_title(messages: &[Message]) -> String {
        let text = messages
            .iter()
            .find(|m| m.is_user())
            .map(|m| m.content.trim())
            .unwrap_or("New thread");
        if text.is_empty() {
            return "New thread".to_string();
        }
        let mut title: String = text.chars().take(MAX_TITLE_LEN).collect();
        if text.chars().count() > MAX_TITLE_LEN {
            title.push('…');
        }
        title
    }
}
