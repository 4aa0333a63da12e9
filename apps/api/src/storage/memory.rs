//! In-process stores. Back `STORAGE_BACKEND=memory` for local runs and double
//! as test fakes: both record every call, and test builds can make them fail.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{key_matches, FileStore, KvEntry, KvStore, StoreError};

/// Insertion-ordered key-value store.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<Vec<(String, String)>>,
    failing_deletes: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    fail_clear: AtomicBool,
    delete_calls: AtomicUsize,
    clear_calls: AtomicUsize,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryKvStore {
    /// Inserts or replaces `key`, keeping the original position on replace.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        let (key, value) = (key.into(), value.into());
        let mut entries = lock(&self.entries);
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Makes every later `delete(key)` fail with a backend error.
    pub fn fail_delete(&self, key: impl Into<String>) {
        lock(&self.failing_deletes).insert(key.into());
    }

    pub fn fail_clear(&self, fail: bool) {
        self.fail_clear.store(fail, Ordering::SeqCst);
    }

    /// Simulates the store being unreachable for `list`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<KvEntry>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory kv store offline".into()));
        }
        Ok(lock(&self.entries)
            .iter()
            .filter(|(k, _)| key_matches(pattern, k))
            .map(|(k, v)| KvEntry {
                key: k.clone(),
                value: include_values.then(|| v.clone()),
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if lock(&self.failing_deletes).contains(key) {
            return Err(StoreError::Backend(format!("delete rejected for {key}")));
        }
        // Deleting a missing key succeeds, as it does against Redis.
        lock(&self.entries).retain(|(k, _)| k != key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("clear rejected".into()));
        }
        lock(&self.entries).clear();
        Ok(())
    }
}

/// Path-addressed blob store. Deleting a missing path is a `NotFound` error.
#[derive(Default)]
pub struct MemoryFileStore {
    blobs: Mutex<HashMap<String, Bytes>>,
    failing_deletes: Mutex<HashSet<String>>,
    delete_attempts: Mutex<Vec<String>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl MemoryFileStore {
    pub fn put(&self, path: impl Into<String>, data: impl Into<Bytes>) {
        lock(&self.blobs).insert(path.into(), data.into());
    }

    pub fn contains(&self, path: &str) -> bool {
        lock(&self.blobs).contains_key(path)
    }

    pub fn fail_delete(&self, path: impl Into<String>) {
        lock(&self.failing_deletes).insert(path.into());
    }

    /// Every path `delete` was called with, in call order.
    pub fn delete_attempts(&self) -> Vec<String> {
        lock(&self.delete_attempts).clone()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn read_blob(&self, path: &str) -> Result<Bytes, StoreError> {
        lock(&self.blobs)
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        lock(&self.delete_attempts).push(path.to_string());
        if lock(&self.failing_deletes).contains(path) {
            return Err(StoreError::Backend(format!("delete rejected for {path}")));
        }
        lock(&self.blobs)
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}

/// A poisoned lock only means another test thread panicked mid-update;
/// the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
