use crate::chat::{ChatStore, MemoryChatStore};
use crate::registry::room::Room;
use crate::registry::room_command::RoomCommand;
use dashmap::DashMap;
use huddle_core::MeetingId;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Authoritative map of live meetings. An unknown meeting id is created on
/// first join; a room whose last member leaves is reaped along with its
/// registry entry, leaving no residue.
#[derive(Clone)]
pub struct Registry {
    rooms: Arc<DashMap<MeetingId, mpsc::Sender<RoomCommand>>>,
    store: Arc<dyn ChatStore>,
}

impl Registry {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            store,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryChatStore::new()))
    }

    /// Route a command to its room, creating the room if needed. A command
    /// can race the room's shutdown; on a dead channel the stale entry is
    /// dropped and the send retried against a fresh room.
    pub async fn dispatch(&self, meeting: &MeetingId, cmd: RoomCommand) {
        let mut cmd = cmd;
        loop {
            let tx = self.room_sender(meeting);
            match tx.send(cmd).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    cmd = returned;
                    self.rooms
                        .remove_if(meeting, |_, sender| sender.same_channel(&tx));
                }
            }
        }
    }

    fn room_sender(&self, meeting: &MeetingId) -> mpsc::Sender<RoomCommand> {
        if let Some(sender) = self.rooms.get(meeting) {
            return sender.clone();
        }

        let entry = self.rooms.entry(meeting.clone()).or_insert_with(|| {
            info!("Creating room {}", meeting);
            let (tx, rx) = mpsc::channel(100);
            let room = Room::new(meeting.clone(), self.store.clone(), rx);

            let registry = self.clone();
            let key = meeting.clone();
            let probe = tx.clone();
            tokio::spawn(async move {
                let leftovers = room.run().await;
                registry
                    .rooms
                    .remove_if(&key, |_, sender| sender.same_channel(&probe));
                // Joins and other traffic that raced the reap land in a
                // fresh room rather than vanishing.
                for cmd in leftovers {
                    registry.dispatch(&key, cmd).await;
                }
            });

            tx
        });

        entry.clone()
    }

    #[cfg(test)]
    pub(crate) fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
