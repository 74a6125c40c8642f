//! Key-value storage trait and implementations.
//!
//! The hosted deployment backs this with a managed cache service; locally it
//! is a directory of files. Keys are opaque strings like
//! `thread:{user}:{id}`.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

/// Key-value storage trait
#[async_trait]
pub trait KvStorage: Send + Sync {
    /// Read a value, `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// File-based key-value storage, one file per key.
#[derive(Clone)]
pub struct FileKvStorage {
    base_path: PathBuf,
}

impl FileKvStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys contain ':' separators, which are not portable in filenames.
        // The encoding must be injective: distinct keys map to distinct
        // files, so every byte outside [A-Za-z0-9-] (including '_') is
        // escaped as `_xx` hex.
        let mut safe = String::with_capacity(key.len());
        for byte in key.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' => safe.push(byte as char),
                other => safe.push_str(&format!("_{other:02x}")),
            }
        }
        self.base_path.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl KvStorage for FileKvStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path).await?))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;
        fs::write(self.key_path(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).await?;
        Ok(true)
    }
}

/// In-memory key-value storage, used by tests and single-process setups.
#[derive(Default)]
pub struct MemoryKvStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKvStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStorage for MemoryKvStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
