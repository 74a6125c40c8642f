//! Thread Store service

use crate::error::{Result, ThreadStoreError};
use crate::storage::KvStorage;
use chat_core::{Message, Thread, ThreadSummary};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

fn thread_key(user_id: &str, thread_id: &str) -> String {
    format!("thread:{user_id}:{thread_id}")
}

fn user_threads_key(user_id: &str) -> String {
    format!("user:{user_id}:threads")
}

/// Partial update applied by `ThreadStore::update`.
#[derive(Debug, Default, Clone)]
pub struct ThreadPatch {
    pub title: Option<String>,
    pub messages: Option<Vec<Message>>,
    pub model: Option<String>,
}

/// Thread Store - per-user thread persistence over a key-value backend.
pub struct ThreadStore<S: KvStorage> {
    storage: Arc<S>,
}

impl<S: KvStorage> ThreadStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    /// Create a thread. An empty title is derived from the first user
    /// message.
    pub async fn create(
        &self,
        user_id: &str,
        title: &str,
        messages: Vec<Message>,
        model: &str,
    ) -> Result<Thread> {
        let now = Utc::now();
        let title = if title.trim().is_empty() {
            Thread::derive_title(&messages)
        } else {
            title.to_string()
        };
        let thread = Thread {
            id: Uuid::new_v4().to_string(),
            title,
            messages,
            model: model.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.save_thread(user_id, &thread).await?;
        log::info!("created thread {} for user {}", thread.id, user_id);
        Ok(thread)
    }

    /// Load a thread, `None` when absent.
    pub async fn get(&self, user_id: &str, thread_id: &str) -> Result<Option<Thread>> {
        let key = thread_key(user_id, thread_id);
        match self.storage.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Thread summaries for a user, most recently updated first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<ThreadSummary>> {
        let key = user_threads_key(user_id);
        match self.storage.get(&key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Apply a partial update, bump `updated_at` and refresh the recency
    /// list. Errors with `NotFound` when the thread does not exist.
    pub async fn update(
        &self,
        user_id: &str,
        thread_id: &str,
        patch: ThreadPatch,
    ) -> Result<Thread> {
        let mut thread = self
            .get(user_id, thread_id)
            .await?
            .ok_or(ThreadStoreError::NotFound)?;

        if let Some(title) = patch.title {
            thread.title = title;
        }
        if let Some(messages) = patch.messages {
            thread.messages = messages;
        }
        if let Some(model) = patch.model {
            thread.model = model;
        }
        thread.updated_at = Utc::now();

        self.save_thread(user_id, &thread).await?;
        Ok(thread)
    }

    /// Delete a thread and its summary entry. Returns whether it existed.
    pub async fn delete(&self, user_id: &str, thread_id: &str) -> Result<bool> {
        let existed = self.storage.delete(&thread_key(user_id, thread_id)).await?;
        if existed {
            let mut summaries = self.list(user_id).await?;
            summaries.retain(|s| s.id != thread_id);
            self.save_summaries(user_id, &summaries).await?;
            log::info!("deleted thread {thread_id} for user {user_id}");
        }
        Ok(existed)
    }

    async fn save_thread(&self, user_id: &str, thread: &Thread) -> Result<()> {
        let raw = serde_json::to_string(thread)?;
        self.storage
            .set(&thread_key(user_id, &thread.id), &raw)
            .await?;

        // Move this thread to the front of the recency list.
        let mut summaries = self.list(user_id).await?;
        summaries.retain(|s| s.id != thread.id);
        summaries.insert(0, thread.summary());
        self.save_summaries(user_id, &summaries).await
    }

    async fn save_summaries(&self, user_id: &str, summaries: &[ThreadSummary]) -> Result<()> {
        let raw = serde_json::to_string(summaries)?;
        self.storage.set(&user_threads_key(user_id), &raw).await
    }
}
