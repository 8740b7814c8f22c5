//! IdGenerator port - message id generation.
//!
//! # Implementations
//! - **UlidGenerator**: `{queue}_{ULID}`, collision resistant without coordination

use crate::domain::MessageId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator produces ids that are unique per outstanding message.
///
/// # Thread Safety
/// - `Send + Sync` is required (shared by every producer of a queue)
pub trait IdGenerator: Send + Sync {
    /// Generate a fresh id for a message enqueued on `queue`.
    fn generate(&self, queue: &str) -> MessageId;
}

/// UlidGenerator builds ids from the queue name and a ULID.
///
/// The ULID timestamp comes from the injected `Clock`; the remaining 80 bits
/// are random, so two ids generated in the same millisecond still differ.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate(&self, queue: &str) -> MessageId {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        MessageId::new(format!("{queue}_{ulid}"))
    }
}
