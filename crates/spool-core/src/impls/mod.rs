//! Store implementations.
//!
//! - **InMemoryStore**: process-local, for tests and embedding
//! - **RedisStore**: Redis via a managed connection (feature `redis`)

pub mod memory_store;
#[cfg(feature = "redis")]
pub mod redis_store;

pub use memory_store::InMemoryStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;
