use serde::{Deserialize, Serialize};

/// Point-in-time lengths of a queue's lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub pending: u64,
    pub blocked: u64,
}
