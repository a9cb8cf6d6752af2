mod utils;

mod connection_tests;
mod messaging_tests;
mod multi_peer_tests;
mod relay_tests;

use huddle_server::{MemoryChatStore, Room, RoomCommand};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Spawn a room for one meeting over an in-memory chat store and hand back
/// its command channel.
pub fn create_test_room() -> mpsc::Sender<RoomCommand> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<RoomCommand>(100);
    let room = Room::new(
        huddle_core::MeetingId::from("test-meeting"),
        Arc::new(MemoryChatStore::new()),
        cmd_rx,
    );

    tokio::spawn(async move {
        room.run().await;
    });

    cmd_tx
}
