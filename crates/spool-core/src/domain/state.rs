//! Message lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a message currently sits.
///
/// State transitions:
/// - Pending -> InFlight (get)
/// - InFlight -> Removed (ack)
/// - InFlight -> Pending (rollback, retries left)
/// - InFlight -> Blocked (rollback, retries exhausted)
/// - Blocked -> Pending (repair)
///
/// The store holds no per-message state field; a state is implied by which
/// collection currently references the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageState {
    /// Waiting in the index list.
    Pending,

    /// Checked out by a consumer (processing marker held).
    InFlight,

    /// Dead-lettered after exhausting retries.
    Blocked,

    /// Acknowledged and deleted.
    Removed,
}

impl MessageState {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageState::Pending => "pending",
            MessageState::InFlight => "in_flight",
            MessageState::Blocked => "blocked",
            MessageState::Removed => "removed",
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
