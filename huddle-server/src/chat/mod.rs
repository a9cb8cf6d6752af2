use async_trait::async_trait;
use dashmap::DashMap;
use huddle_core::{ChatMessage, MeetingId};

/// Seam to the collaborator that owns chat persistence. The registry only
/// appends and replays; it never deletes.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn append(&self, meeting: &MeetingId, message: ChatMessage);

    /// Full log for a meeting, in append order.
    async fn read_all(&self, meeting: &MeetingId) -> Vec<ChatMessage>;
}

/// Default in-process store. Lives and dies with the server, which is all
/// the core itself guarantees.
#[derive(Default)]
pub struct MemoryChatStore {
    logs: DashMap<MeetingId, Vec<ChatMessage>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn append(&self, meeting: &MeetingId, message: ChatMessage) {
        self.logs.entry(meeting.clone()).or_default().push(message);
    }

    async fn read_all(&self, meeting: &MeetingId) -> Vec<ChatMessage> {
        self.logs
            .get(meeting)
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}
