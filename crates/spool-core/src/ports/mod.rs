//! Ports - abstraction layer over external systems.
//!
//! Each trait is the seam between the queue engine and something it does not
//! own: the key-value store, the clock, the id scheme.

pub mod clock;
pub mod id_generator;
pub mod store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::store::Store;
