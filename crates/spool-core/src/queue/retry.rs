//! Retry policy: decides whether a rolled-back message is requeued or
//! dead-lettered.

use serde::{Deserialize, Serialize};

use crate::domain::MessageState;

/// What happens to a message after a rollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryDecision {
    /// Back onto the index list, behind everything already pending.
    Requeue,

    /// Onto the blocked list until the next repair.
    Block,
}

impl RetryDecision {
    /// State the message enters once the decision is applied.
    pub fn target_state(self) -> MessageState {
        match self {
            RetryDecision::Requeue => MessageState::Pending,
            RetryDecision::Block => MessageState::Blocked,
        }
    }
}

/// Retry policy for rolled-back messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry count at which a message is dead-lettered.
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Decide the fate of a message whose retry count is now `attempts`
    /// (already incremented for the current rollback).
    pub fn decide(&self, attempts: u32) -> RetryDecision {
        if attempts >= self.max_retries {
            RetryDecision::Block
        } else {
            RetryDecision::Requeue
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
