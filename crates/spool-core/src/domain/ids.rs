//! Message identifiers.
//!
//! Ids travel through the store as plain strings, so `MessageId` is a thin
//! newtype over `String` rather than a parsed ULID: anything popped from an
//! index list must round-trip even if another producer wrote it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one enqueued message, unique per outstanding message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_raw_value() {
        let id = MessageId::new("orders_01HZX");
        assert_eq!(id.to_string(), "orders_01HZX");
        assert_eq!(id.as_str(), "orders_01HZX");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = MessageId::from("orders_1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"orders_1\"");

        let back: MessageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
