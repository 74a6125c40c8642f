//! thread_store - Key-value persistence of conversation threads
//!
//! A thin wrapper over a key-value backend. Threads serialize as JSON text
//! under `thread:{user_id}:{thread_id}`; each user additionally has a
//! recency-ordered summary list under `user:{user_id}:threads`. Last write
//! wins; there is no locking discipline beyond the backend's own.

mod error;
mod storage;
mod store;

pub use error::{Result, ThreadStoreError};
pub use storage::{FileKvStorage, KvStorage, MemoryKvStorage};
pub use store::{ThreadPatch, ThreadStore};
