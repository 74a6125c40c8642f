//! Thread store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThreadStoreError {
    #[error("Thread not found")]
    NotFound,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ThreadStoreError>;
