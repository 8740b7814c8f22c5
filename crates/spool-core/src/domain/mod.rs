//! Domain model (ids, messages, lifecycle states).

pub mod ids;
pub mod message;
pub mod state;

pub use ids::MessageId;
pub use message::Message;
pub use state::MessageState;
