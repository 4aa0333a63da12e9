//! Storage seams: the key-value store holding record metadata and the file
//! store holding each record's blobs.
//!
//! The two stores are independent backends with no shared transaction.
//! Callers hold them as `Arc<dyn KvStore>` / `Arc<dyn FileStore>` so the
//! remote adapters (Redis, S3) and the in-memory ones are interchangeable.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub mod memory;
pub mod redis_kv;
pub mod s3_files;

pub use memory::{MemoryFileStore, MemoryKvStore};
pub use redis_kv::RedisKvStore;
pub use s3_files::S3FileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// One key-value pair returned by [`KvStore::list`].
/// `value` is `None` when values were not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub key: String,
    pub value: Option<String>,
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Lists entries whose key matches `pattern`. A trailing `*` matches any
    /// suffix; anything else is an exact key. Order is the store's order.
    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvEntry>, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Drops every key in this store's namespace in one operation.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn read_blob(&self, path: &str) -> Result<Bytes, StoreError>;

    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Matches a key against a wildcard-suffix pattern (`resume:*`).
pub fn key_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}
