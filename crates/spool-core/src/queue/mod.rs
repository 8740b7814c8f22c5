//! Queue module: key namespace, retry policy and the queue engine.

mod engine;
mod keys;
mod retry;
mod status;

pub use engine::WorkQueue;
pub use keys::KeySpace;
pub use retry::{RetryDecision, RetryPolicy};
pub use status::QueueStatus;
