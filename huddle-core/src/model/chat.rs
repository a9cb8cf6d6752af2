use serde::{Deserialize, Serialize};

/// One chat message. Immutable once created; the timestamp is assigned by
/// the registry so every member observes the same ordering.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub sender: String,
    pub text: String,
    pub timestamp_ms: u64,
}
