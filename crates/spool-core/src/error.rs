//! Error types for spool-core.

use thiserror::Error;

use crate::domain::MessageId;

/// Failure reported by a [`Store`](crate::ports::Store) adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store operation failed: {0}")]
    OperationFailed(String),

    #[cfg(feature = "redis")]
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Errors surfaced by [`WorkQueue`](crate::queue::WorkQueue) operations.
///
/// The engine never retries on its own; every store failure reaches the
/// caller, who decides whether to repeat the whole queue operation.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Bad construction arguments, or the store was unreachable at startup.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// `add` could not record the message. The id may already be visible
    /// in the index list without a payload; `get` discards such ids.
    #[error("failed to write message {id}: {source}")]
    WriteFailure {
        id: MessageId,
        #[source]
        source: StoreError,
    },

    /// Single-consumer queues hand out one message at a time.
    #[error("queue {queue} already has message {id} in flight")]
    AlreadyProcessing { queue: String, id: MessageId },

    #[error("payload encoding failed: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
