//! The queue engine: add / get / ack / rollback / repair / status.
//!
//! Every operation is a short sequence of single-key store commands. There is
//! no transaction across them, so a crash between two commands can leave a
//! message half-moved. The orderings below are chosen so such a message is
//! always still referenced by the index list, the blocked list or a
//! processing marker, which is where `repair` looks for it.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{KeySpace, QueueStatus, RetryDecision, RetryPolicy};
use crate::config::QueueConfig;
use crate::domain::{Message, MessageId, MessageState};
use crate::error::{QueueError, Result};
use crate::ports::{IdGenerator, Store, SystemClock, UlidGenerator};

/// A reliable work queue over a [`Store`].
///
/// `WorkQueue` holds no in-process locks; share it with `Arc` and call it
/// from as many tasks (or processes, each with its own instance) as needed.
pub struct WorkQueue<S, G = UlidGenerator<SystemClock>> {
    store: S,
    ids: G,
    keys: KeySpace,
    policy: RetryPolicy,
    config: QueueConfig,
}

impl<S: Store> WorkQueue<S> {
    /// Validate `config`, check the store is reachable, and build a queue
    /// that names messages with ULIDs.
    pub async fn new(store: S, config: QueueConfig) -> Result<Self> {
        Self::with_id_generator(store, config, UlidGenerator::new(SystemClock)).await
    }
}

#[cfg(feature = "redis")]
impl WorkQueue<crate::impls::RedisStore> {
    /// Connect to Redis and build a queue on it.
    pub async fn connect(config: QueueConfig, store: &crate::config::StoreConfig) -> Result<Self> {
        config.validate()?;
        store.validate()?;
        let redis = crate::impls::RedisStore::connect(store)
            .await
            .map_err(|e| QueueError::Config(format!("queue init failed: {e}")))?;
        Self::new(redis, config).await
    }
}

impl<S: Store, G: IdGenerator> WorkQueue<S, G> {
    pub async fn with_id_generator(store: S, config: QueueConfig, ids: G) -> Result<Self> {
        config.validate()?;
        store
            .ping()
            .await
            .map_err(|e| QueueError::Config(format!("queue init failed: {e}")))?;

        let keys = KeySpace::new(&config.key_prefix, &config.name);
        let policy = RetryPolicy::new(config.max_retries);
        Ok(Self {
            store,
            ids,
            keys,
            policy,
            config,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enqueue `payload`, returning the id it was stored under.
    ///
    /// The id is pushed before the payload is written. If the payload write
    /// fails the call reports `WriteFailure`, but the id stays in the index
    /// list without data; the consumer that pops it discards it.
    pub async fn add<T>(&self, payload: &T) -> Result<MessageId>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_string(payload)?;
        let id = self.ids.generate(&self.config.name);

        if let Err(source) = self.store.push(self.keys.index(), id.as_str()).await {
            return Err(QueueError::WriteFailure { id, source });
        }
        if let Err(source) = self.store.hash_set(self.keys.data(), id.as_str(), &data).await {
            warn!(queue = %self.config.name, %id, "payload write failed after id was enqueued");
            return Err(QueueError::WriteFailure { id, source });
        }

        debug!(queue = %self.config.name, %id, state = %MessageState::Pending, "message added");
        Ok(id)
    }

    /// Check out the oldest pending message.
    ///
    /// Returns `Ok(None)` after waiting `config.wait` when nothing is pending,
    /// and immediately when the popped id has no readable payload (the id is
    /// discarded; call again for the next one). On a single-consumer queue a
    /// held marker fails the call with `AlreadyProcessing`. That check and the
    /// pop are separate commands, so two processes racing on an idle
    /// single-consumer queue can each check out one message.
    ///
    /// Not cancellation safe: dropping the future between the pop and the
    /// marker write loses the message until its data is cleaned up manually.
    pub async fn get(&self) -> Result<Option<Message>> {
        if !self.config.concurrent_consumers
            && let Some(current) = self.store.get(self.keys.single_marker()).await?
        {
            return Err(QueueError::AlreadyProcessing {
                queue: self.config.name.clone(),
                id: MessageId::from(current),
            });
        }

        let Some(raw) = self.store.pop(self.keys.index()).await? else {
            tokio::time::sleep(self.config.wait).await;
            return Ok(None);
        };
        let id = MessageId::from(raw);

        let payload = match self.store.hash_get(self.keys.data(), id.as_str()).await? {
            Some(data) => serde_json::from_str::<serde_json::Value>(&data)
                .inspect_err(|e| warn!(queue = %self.config.name, %id, error = %e, "undecodable payload"))
                .ok(),
            None => None,
        };
        let Some(payload) = payload else {
            warn!(queue = %self.config.name, %id, "popped id has no payload, discarding");
            self.release(&id).await?;
            self.store.hash_delete(self.keys.data(), id.as_str()).await?;
            return Ok(None);
        };

        self.store.set(&self.marker_key(&id), id.as_str()).await?;
        debug!(queue = %self.config.name, %id, state = %MessageState::InFlight, "message checked out");
        Ok(Some(Message::new(id, payload)))
    }

    /// Finish `id`: drop its marker, payload and retry count.
    ///
    /// Idempotent. Returns whether a payload was actually deleted, which is a
    /// weak signal of whether the message still existed.
    pub async fn ack(&self, id: &MessageId) -> Result<bool> {
        self.release(id).await?;
        let removed = self.store.hash_delete(self.keys.data(), id.as_str()).await?;
        self.store.hash_delete(self.keys.retries(), id.as_str()).await?;

        debug!(queue = %self.config.name, %id, removed, state = %MessageState::Removed, "message acked");
        Ok(removed)
    }

    /// Give `id` back after a failed attempt.
    ///
    /// Returns `None` when `id` is not in flight. Otherwise bumps the retry
    /// count and requeues or dead-letters the id per the retry policy. The
    /// marker is released only after that push succeeds; if the push fails
    /// the marker stays and the message waits for `repair`.
    pub async fn rollback(&self, id: &MessageId) -> Result<Option<RetryDecision>> {
        if !self.is_processing(id).await? {
            debug!(queue = %self.config.name, %id, "rollback ignored, message not in flight");
            return Ok(None);
        }

        let attempts = self
            .store
            .hash_incr(self.keys.retries(), id.as_str(), 1)
            .await?;
        let attempts = u32::try_from(attempts.max(0)).unwrap_or(u32::MAX);
        let decision = self.policy.decide(attempts);
        let target = match decision {
            RetryDecision::Requeue => self.keys.index(),
            RetryDecision::Block => self.keys.blocked(),
        };

        if let Err(e) = self.store.push(target, id.as_str()).await {
            warn!(queue = %self.config.name, %id, attempts, error = %e, "rollback push failed, marker kept");
            return Err(e.into());
        }
        self.release(id).await?;

        let state = decision.target_state();
        if decision == RetryDecision::Block {
            warn!(queue = %self.config.name, %id, attempts, %state, "retries exhausted, message blocked");
        } else {
            debug!(queue = %self.config.name, %id, attempts, %state, "message requeued");
        }
        Ok(Some(decision))
    }

    /// Recovery sweep.
    ///
    /// Moves every blocked id back to the index list with a cleared retry
    /// count, then clears every processing marker. A marked id whose payload
    /// still exists was orphaned by a consumer that never finished; it is
    /// requeued exactly once, with a cleared retry count, before its marker
    /// is removed.
    ///
    /// Returns the number of blocked ids restored. Run it while no consumer is
    /// active; concurrent consumers may see a message delivered twice.
    pub async fn repair(&self) -> Result<u64> {
        let mut restored = 0u64;
        while let Some(raw) = self.store.pop(self.keys.blocked()).await? {
            self.store.push(self.keys.index(), &raw).await?;
            self.store.hash_delete(self.keys.retries(), &raw).await?;
            restored += 1;
        }

        let reclaimed = self.reclaim_markers().await?;
        info!(queue = %self.config.name, restored, reclaimed, "repair finished");
        Ok(restored)
    }

    pub async fn status(&self) -> Result<QueueStatus> {
        Ok(QueueStatus {
            pending: self.store.len(self.keys.index()).await?,
            blocked: self.store.len(self.keys.blocked()).await?,
        })
    }

    /// Whether a processing marker is held for `id`.
    pub async fn is_processing(&self, id: &MessageId) -> Result<bool> {
        let current = self.store.get(&self.marker_key(id)).await?;
        Ok(current.as_deref() == Some(id.as_str()))
    }

    /// Rollbacks recorded for `id` since it was added or last repaired.
    pub async fn retry_count(&self, id: &MessageId) -> Result<u32> {
        let raw = self.store.hash_get(self.keys.retries(), id.as_str()).await?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or(0))
    }

    fn marker_key(&self, id: &MessageId) -> String {
        if self.config.concurrent_consumers {
            self.keys.marker(id)
        } else {
            self.keys.single_marker().to_string()
        }
    }

    /// Drop the processing marker of `id`. The single-slot marker is only
    /// removed when it holds `id`, so a stale ack cannot free another
    /// consumer's slot.
    async fn release(&self, id: &MessageId) -> Result<()> {
        if self.config.concurrent_consumers {
            self.store.delete(&self.keys.marker(id)).await?;
        } else if self.is_processing(id).await? {
            self.store.delete(self.keys.single_marker()).await?;
        }
        Ok(())
    }

    async fn reclaim_markers(&self) -> Result<u64> {
        let markers = if self.config.concurrent_consumers {
            self.store.keys_matching(&self.keys.marker_pattern()).await?
        } else {
            vec![self.keys.single_marker().to_string()]
        };

        let mut reclaimed = 0u64;
        for key in markers {
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };
            if self.store.hash_get(self.keys.data(), &raw).await?.is_some() {
                // a rollback may have pushed the id before losing its marker
                self.store.list_remove(self.keys.index(), &raw).await?;
                self.store.list_remove(self.keys.blocked(), &raw).await?;
                self.store.push(self.keys.index(), &raw).await?;
                self.store.hash_delete(self.keys.retries(), &raw).await?;
                reclaimed += 1;
            }
            self.store.delete(&key).await?;
        }
        Ok(reclaimed)
    }
}
