//! Partial-failure windows: a store that fails selected commands on demand.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rstest::rstest;
use serde_json::json;
use spool_core::impls::InMemoryStore;
use spool_core::ports::Store;
use spool_core::{
    MessageId, QueueConfig, QueueError, QueueStatus, RetryDecision, StoreError, WorkQueue,
};

/// Wraps `InMemoryStore` and fails pushes to one list, data writes or key
/// deletes while the corresponding switch is set.
#[derive(Default)]
struct FaultyStore {
    inner: InMemoryStore,
    fail_push_to: Mutex<Option<String>>,
    fail_hash_set: Mutex<bool>,
    fail_delete: Mutex<bool>,
    down: Mutex<bool>,
}

impl FaultyStore {
    fn fail_push_to(&self, list: Option<&str>) {
        *self.fail_push_to.lock().unwrap() = list.map(str::to_string);
    }

    fn fail_hash_set(&self, fail: bool) {
        *self.fail_hash_set.lock().unwrap() = fail;
    }

    fn fail_delete(&self, fail: bool) {
        *self.fail_delete.lock().unwrap() = fail;
    }

    fn set_down(&self, down: bool) {
        *self.down.lock().unwrap() = down;
    }

    fn check(&self) -> Result<(), StoreError> {
        let down = *self.down.lock().unwrap();
        if down {
            return Err(StoreError::Connection("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FaultyStore {
    async fn push(&self, list: &str, value: &str) -> Result<u64, StoreError> {
        self.check()?;
        let rejected = self.fail_push_to.lock().unwrap().as_deref() == Some(list);
        if rejected {
            return Err(StoreError::OperationFailed(format!("push to {list} rejected")));
        }
        self.inner.push(list, value).await
    }

    async fn pop(&self, list: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.pop(list).await
    }

    async fn len(&self, list: &str) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.len(list).await
    }

    async fn list_remove(&self, list: &str, value: &str) -> Result<u64, StoreError> {
        self.check()?;
        self.inner.list_remove(list, value).await
    }

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.hash_get(map, field).await
    }

    async fn hash_set(&self, map: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        let rejected = *self.fail_hash_set.lock().unwrap();
        if rejected {
            return Err(StoreError::OperationFailed("hash write rejected".into()));
        }
        self.inner.hash_set(map, field, value).await
    }

    async fn hash_delete(&self, map: &str, field: &str) -> Result<bool, StoreError> {
        self.check()?;
        self.inner.hash_delete(map, field).await
    }

    async fn hash_incr(&self, map: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        self.check()?;
        self.inner.hash_incr(map, field, delta).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check()?;
        let rejected = *self.fail_delete.lock().unwrap();
        if rejected {
            return Err(StoreError::OperationFailed(format!("delete of {key} rejected")));
        }
        self.inner.delete(key).await
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        self.check()?;
        self.inner.keys_matching(pattern).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

async fn queue(config: QueueConfig) -> WorkQueue<FaultyStore> {
    WorkQueue::new(FaultyStore::default(), config.wait(Duration::ZERO))
        .await
        .unwrap()
}

#[tokio::test]
async fn unreachable_store_fails_construction() {
    let store = FaultyStore::default();
    store.set_down(true);

    let result = WorkQueue::new(store, QueueConfig::new("orders")).await;
    assert!(matches!(result, Err(QueueError::Config(_))));
}

#[tokio::test]
async fn failed_index_push_reports_write_failure() {
    let q = queue(QueueConfig::new("orders")).await;
    q.store().fail_push_to(Some(q.keys().index()));

    let err = q.add(&json!(1)).await.unwrap_err();
    assert!(matches!(err, QueueError::WriteFailure { .. }));
    assert_eq!(q.status().await.unwrap(), QueueStatus::default());
}

#[tokio::test]
async fn failed_data_write_leaves_dangling_id_for_get_to_discard() {
    let q = queue(QueueConfig::new("orders")).await;
    q.store().fail_hash_set(true);

    let id = match q.add(&json!({"amount": 1})).await {
        Err(QueueError::WriteFailure { id, .. }) => id,
        other => panic!("expected WriteFailure, got {other:?}"),
    };
    // the push already happened
    assert_eq!(q.status().await.unwrap().pending, 1);

    q.store().fail_hash_set(false);
    assert!(q.get().await.unwrap().is_none());
    assert!(!q.is_processing(&id).await.unwrap());
    assert_eq!(q.status().await.unwrap().pending, 0);
}

#[tokio::test]
async fn failed_rollback_push_keeps_marker_until_repair() {
    let q = queue(QueueConfig::new("orders")).await;
    let id = q.add(&json!({"amount": 1})).await.unwrap();
    q.get().await.unwrap().unwrap();

    q.store().fail_push_to(Some(q.keys().index()));
    let err = q.rollback(&id).await.unwrap_err();
    assert!(matches!(err, QueueError::Store(_)));
    assert!(q.is_processing(&id).await.unwrap());
    assert_eq!(q.retry_count(&id).await.unwrap(), 1);

    q.store().fail_push_to(None);
    q.repair().await.unwrap();
    assert!(!q.is_processing(&id).await.unwrap());
    assert_eq!(q.retry_count(&id).await.unwrap(), 0);

    let msg = q.get().await.unwrap().unwrap();
    assert_eq!(msg.id(), &id);
}

#[tokio::test]
async fn reclaimed_message_gets_a_fresh_retry_budget() {
    let q = queue(QueueConfig::new("orders").max_retries(2)).await;
    let id = q.add(&json!(1)).await.unwrap();
    q.get().await.unwrap().unwrap();

    q.store().fail_push_to(Some(q.keys().index()));
    assert!(q.rollback(&id).await.is_err());
    q.store().fail_push_to(None);
    q.repair().await.unwrap();

    q.get().await.unwrap().unwrap();
    assert_eq!(q.rollback(&id).await.unwrap(), Some(RetryDecision::Requeue));
    assert_eq!(q.retry_count(&id).await.unwrap(), 1);
}

#[rstest]
#[case::requeued(3, 0)]
#[case::blocked(1, 1)]
#[tokio::test]
async fn repair_after_lost_marker_delete_queues_id_once(
    #[case] max_retries: u32,
    #[case] restored: u64,
) {
    let q = queue(QueueConfig::new("orders").max_retries(max_retries)).await;
    let id = q.add(&json!({"amount": 1})).await.unwrap();
    q.get().await.unwrap().unwrap();

    // push lands, marker delete fails
    q.store().fail_delete(true);
    assert!(q.rollback(&id).await.is_err());
    assert!(q.is_processing(&id).await.unwrap());
    q.store().fail_delete(false);

    assert_eq!(q.repair().await.unwrap(), restored);
    assert_eq!(q.store().inner.list(q.keys().index()).await, vec![id.to_string()]);
    assert_eq!(q.status().await.unwrap(), QueueStatus { pending: 1, blocked: 0 });
    assert_eq!(q.retry_count(&id).await.unwrap(), 0);

    assert_eq!(q.get().await.unwrap().unwrap().id(), &id);
    assert!(q.get().await.unwrap().is_none());
}

#[tokio::test]
async fn failed_block_push_keeps_marker() {
    let q = queue(QueueConfig::new("orders").max_retries(1)).await;
    let id = q.add(&json!(1)).await.unwrap();
    q.get().await.unwrap().unwrap();

    q.store().fail_push_to(Some(q.keys().blocked()));
    assert!(q.rollback(&id).await.is_err());
    assert!(q.is_processing(&id).await.unwrap());
    assert_eq!(q.status().await.unwrap(), QueueStatus::default());
}

#[tokio::test]
async fn connectivity_loss_surfaces_from_every_operation() {
    let q = queue(QueueConfig::new("orders")).await;
    let id = MessageId::from("orders_1");
    q.store().set_down(true);

    assert!(matches!(q.add(&json!(1)).await, Err(QueueError::WriteFailure { .. })));
    assert!(matches!(q.get().await, Err(QueueError::Store(_))));
    assert!(matches!(q.ack(&id).await, Err(QueueError::Store(_))));
    assert!(matches!(q.rollback(&id).await, Err(QueueError::Store(_))));
    assert!(matches!(q.repair().await, Err(QueueError::Store(_))));
    assert!(matches!(q.status().await, Err(QueueError::Store(_))));
}
