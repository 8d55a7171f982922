//! In-process implementation of [`KeyValueStore`].
//!
//! Hashes and lists live in `HashMap`s behind a single
//! [`tokio::sync::RwLock`]. Expiry is lazy: an expired hash is invisible to
//! every read and is physically dropped by the next write touching it or by
//! [`KeyValueStore::purge_expired`].

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Fields, KeyValueStore, StorageError};

#[derive(Debug)]
struct HashEntry {
    fields: Fields,
    expires_at: Option<Instant>,
}

impl HashEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
struct Inner {
    hashes: HashMap<String, HashEntry>,
    lists: HashMap<String, VecDeque<String>>,
    /// Insertion order of hash keys, so listing is stable.
    order: Vec<String>,
}

impl Inner {
    fn live(&self, key: &str, now: Instant) -> Option<&HashEntry> {
        self.hashes.get(key).filter(|entry| !entry.is_expired(now))
    }

    fn drop_hash(&mut self, key: &str) -> Option<HashEntry> {
        let removed = self.hashes.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }
}

/// Key-value store held entirely in memory.
///
/// Cheap to construct; state is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, fields: &Fields) -> Result<(), StorageError> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        if inner.hashes.get(key).is_some_and(|e| e.is_expired(now)) {
            inner.drop_hash(key);
        }
        if let Some(entry) = inner.hashes.get_mut(key) {
            entry.fields.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        } else {
            inner.hashes.insert(
                key.to_string(),
                HashEntry {
                    fields: fields.clone(),
                    expires_at: None,
                },
            );
            inner.order.push(key.to_string());
        }
        Ok(())
    }

    async fn get_all(&self, key: &str) -> Result<Option<Fields>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.live(key, Instant::now()).map(|e| e.fields.clone()))
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        Ok(inner.drop_hash(key).is_some_and(|e| !e.is_expired(now)))
    }

    async fn delete_if(
        &self,
        key: &str,
        field: &str,
        expected: &str,
    ) -> Result<bool, StorageError> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let matches = inner
            .live(key, now)
            .is_some_and(|e| e.fields.get(field).is_some_and(|v| v == expected));
        if matches {
            inner.drop_hash(key);
        }
        Ok(matches)
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let now = Instant::now();
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter(|k| k.starts_with(prefix) && inner.live(k, now).is_some())
            .cloned()
            .collect())
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> Result<bool, StorageError> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        match inner.hashes.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = now.checked_add(Duration::from_secs(seconds));
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner.live(key, Instant::now()).is_some())
    }

    async fn push_to_list(&self, list_key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        inner
            .lists
            .entry(list_key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn remove_from_list(&self, list_key: &str, value: &str) -> Result<u64, StorageError> {
        let mut inner = self.inner.write().await;
        let Some(list) = inner.lists.get_mut(list_key) else {
            return Ok(0);
        };
        let before = list.len();
        list.retain(|v| v != value);
        let removed = before.saturating_sub(list.len());
        if list.is_empty() {
            inner.lists.remove(list_key);
        }
        Ok(removed as u64)
    }

    async fn range_list(&self, list_key: &str) -> Result<Vec<String>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .lists
            .get(list_key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn purge_expired(&self) -> Result<u64, StorageError> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let expired: Vec<String> = inner
            .hashes
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.drop_hash(key);
        }
        Ok(expired.len() as u64)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn close(&self) {
        tracing::debug!("memory store closed");
    }
}
