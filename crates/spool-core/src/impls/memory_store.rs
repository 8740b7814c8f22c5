//! InMemoryStore - a process-local stand-in for the key-value store.
//!
//! Lists, hashes and string keys share one key space, like Redis: empty
//! lists and hashes disappear, and `keys_matching` sees every key kind.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::ports::Store;

#[derive(Default)]
struct Keyspace {
    lists: HashMap<String, VecDeque<String>>,
    hashes: HashMap<String, HashMap<String, String>>,
    strings: HashMap<String, String>,
}

impl Keyspace {
    fn all_keys(&self) -> impl Iterator<Item = &String> {
        self.lists
            .keys()
            .chain(self.hashes.keys())
            .chain(self.strings.keys())
    }
}

/// InMemoryStore keeps everything behind one async mutex, so every method
/// is atomic with respect to every other, as single store commands are.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Keyspace>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a list, head first.
    pub async fn list(&self, list: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .lists
            .get(list)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn push(&self, list: &str, value: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let entries = inner.lists.entry(list.to_string()).or_default();
        entries.push_front(value.to_string());
        Ok(entries.len() as u64)
    }

    async fn pop(&self, list: &str) -> Result<Option<String>, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(entries) = inner.lists.get_mut(list) else {
            return Ok(None);
        };
        let value = entries.pop_back();
        if entries.is_empty() {
            inner.lists.remove(list);
        }
        Ok(value)
    }

    async fn len(&self, list: &str) -> Result<u64, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.lists.get(list).map_or(0, |l| l.len() as u64))
    }

    async fn list_remove(&self, list: &str, value: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(entries) = inner.lists.get_mut(list) else {
            return Ok(0);
        };
        let before = entries.len();
        entries.retain(|v| v != value);
        let removed = (before - entries.len()) as u64;
        if entries.is_empty() {
            inner.lists.remove(list);
        }
        Ok(removed)
    }

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.hashes.get(map).and_then(|h| h.get(field)).cloned())
    }

    async fn hash_set(&self, map: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner
            .hashes
            .entry(map.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_delete(&self, map: &str, field: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(fields) = inner.hashes.get_mut(map) else {
            return Ok(false);
        };
        let removed = fields.remove(field).is_some();
        if fields.is_empty() {
            inner.hashes.remove(map);
        }
        Ok(removed)
    }

    async fn hash_incr(&self, map: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock().await;
        let slot = inner
            .hashes
            .entry(map.to_string())
            .or_default()
            .entry(field.to_string())
            .or_insert_with(|| "0".to_string());
        let current: i64 = slot.parse().map_err(|_| {
            StoreError::OperationFailed(format!("hash value is not an integer: {map}/{field}"))
        })?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| StoreError::OperationFailed("increment would overflow".into()))?;
        *slot = next.to_string();
        Ok(next)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        let removed = inner.strings.remove(key).is_some()
            | inner.lists.remove(key).is_some()
            | inner.hashes.remove(key).is_some();
        Ok(removed)
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().await;
        let pattern: Vec<char> = pattern.chars().collect();
        let mut keys: Vec<String> = inner
            .all_keys()
            .filter(|key| glob_match(&pattern, &key.chars().collect::<Vec<_>>()))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Glob matching with `*`, `?` and `\` escapes (no character classes).
fn glob_match(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some(('?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some(('\\', [escaped, rest @ ..])) => {
            text.first() == Some(escaped) && glob_match(rest, &text[1..])
        }
        Some((c, rest)) => text.first() == Some(c) && glob_match(rest, &text[1..]),
    }
}
