//! Store port - the key-value capability surface the queue engine consumes.
//!
//! Each method maps to one atomic store command. Nothing here spans more than
//! one key, and the engine assumes no transaction across calls.

use async_trait::async_trait;

use crate::error::StoreError;

/// Store is a remote key-value store with ordered lists, hash maps and
/// plain string keys (Redis, or an in-memory stand-in).
///
/// # List orientation
/// - `push` inserts at the head, `pop` removes from the tail
/// - a list fed only by `push` and drained only by `pop` is FIFO
#[async_trait]
pub trait Store: Send + Sync {
    /// Push `value` at the head of `list`; returns the new length.
    async fn push(&self, list: &str, value: &str) -> Result<u64, StoreError>;

    /// Pop one value from the tail of `list`.
    async fn pop(&self, list: &str) -> Result<Option<String>, StoreError>;

    /// Length of `list` (0 when absent).
    async fn len(&self, list: &str) -> Result<u64, StoreError>;

    /// Remove every occurrence of `value` from `list`; returns how many
    /// were removed.
    async fn list_remove(&self, list: &str, value: &str) -> Result<u64, StoreError>;

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<String>, StoreError>;

    async fn hash_set(&self, map: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `field` from `map`; returns whether a field was removed.
    async fn hash_delete(&self, map: &str, field: &str) -> Result<bool, StoreError>;

    /// Atomically add `delta` to an integer field (absent counts as 0).
    async fn hash_incr(&self, map: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`; returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Keys matching a glob pattern (`*`, `?`, `\` escapes).
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn push(&self, list: &str, value: &str) -> Result<u64, StoreError> {
        (**self).push(list, value).await
    }

    async fn pop(&self, list: &str) -> Result<Option<String>, StoreError> {
        (**self).pop(list).await
    }

    async fn len(&self, list: &str) -> Result<u64, StoreError> {
        (**self).len(list).await
    }

    async fn list_remove(&self, list: &str, value: &str) -> Result<u64, StoreError> {
        (**self).list_remove(list, value).await
    }

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<String>, StoreError> {
        (**self).hash_get(map, field).await
    }

    async fn hash_set(&self, map: &str, field: &str, value: &str) -> Result<(), StoreError> {
        (**self).hash_set(map, field, value).await
    }

    async fn hash_delete(&self, map: &str, field: &str) -> Result<bool, StoreError> {
        (**self).hash_delete(map, field).await
    }

    async fn hash_incr(&self, map: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        (**self).hash_incr(map, field, delta).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        (**self).delete(key).await
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys_matching(pattern).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}
