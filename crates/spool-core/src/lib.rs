//! spool-core
//!
//! A reliable work queue layered on a key-value store with atomic list and
//! hash operations (Redis). Producers `add`; consumers `get`, then `ack` or
//! `rollback`. Rolled-back messages are retried up to a limit and then
//! parked on a blocked list; `repair` brings blocked and orphaned messages
//! back.
//!
//! # Modules
//! - **domain**: message ids, messages, lifecycle states
//! - **ports**: `Store`, `IdGenerator`, `Clock` traits
//! - **impls**: `InMemoryStore`, `RedisStore`
//! - **queue**: key namespace, retry policy, the `WorkQueue` engine
//! - **worker**: get/handle/ack-or-rollback loops
//! - **config**, **telemetry**, **error**

pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod telemetry;
pub mod worker;

pub use config::{QueueConfig, StoreConfig};
pub use domain::{Message, MessageId, MessageState};
pub use error::{QueueError, Result, StoreError};
pub use queue::{QueueStatus, RetryDecision, RetryPolicy, WorkQueue};
pub use worker::{CycleOutcome, MessageHandler, WorkerGroup, run_once};
