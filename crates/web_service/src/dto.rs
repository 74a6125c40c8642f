//! Request/response DTOs for the HTTP surface.

use chat_core::{Attachment, Message, Thread, ThreadSummary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub success: bool,
    pub thread: Thread,
}

#[derive(Debug, Serialize)]
pub struct ThreadsResponse {
    pub success: bool,
    pub threads: Vec<ThreadSummary>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateThreadRequest {
    pub title: Option<String>,
    pub messages: Option<Vec<Message>>,
    pub model: Option<String>,
}

/// One chat turn. `thread_id` is absent on the first send; the thread is
/// created when the turn completes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    pub query: String,
    pub model: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}
