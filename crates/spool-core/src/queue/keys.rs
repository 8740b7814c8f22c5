//! Key namespace: names of the collections backing one queue.

use crate::domain::MessageId;

/// Deterministic key names for one queue.
///
/// | collection | key |
/// |---|---|
/// | index list (pending ids) | `{prefix}:IL:{queue}` |
/// | blocked list (dead letters) | `{prefix}:BL:{queue}` |
/// | data map (id -> payload) | `{prefix}:DH:{queue}` |
/// | retry-count map (id -> count) | `{prefix}:BTH:{queue}` |
/// | processing marker, per id | `{prefix}:PI:{queue}:{id}` |
/// | processing marker, single slot | `{prefix}:PI:{queue}` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    index: String,
    blocked: String,
    data: String,
    retries: String,
    marker_base: String,
}

impl KeySpace {
    pub fn new(prefix: &str, queue: &str) -> Self {
        Self {
            index: format!("{prefix}:IL:{queue}"),
            blocked: format!("{prefix}:BL:{queue}"),
            data: format!("{prefix}:DH:{queue}"),
            retries: format!("{prefix}:BTH:{queue}"),
            marker_base: format!("{prefix}:PI:{queue}"),
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn blocked(&self) -> &str {
        &self.blocked
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn retries(&self) -> &str {
        &self.retries
    }

    /// The one marker of a single-consumer queue.
    pub fn single_marker(&self) -> &str {
        &self.marker_base
    }

    /// The marker of `id` in a concurrent-consumer queue.
    pub fn marker(&self, id: &MessageId) -> String {
        format!("{}:{}", self.marker_base, id)
    }

    /// Glob matching every per-id marker of this queue and nothing else.
    pub fn marker_pattern(&self) -> String {
        format!("{}:*", escape_glob(&self.marker_base))
    }
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
