//! Message: a payload tagged with the id it was enqueued under.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::MessageId;

/// A message handed to a consumer by `get`.
///
/// The consumer owns it until it calls `ack` or `rollback` with `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    payload: serde_json::Value,
}

impl Message {
    pub fn new(id: MessageId, payload: serde_json::Value) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Decode the payload into a caller type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }
}
