pub mod chat;
pub mod registry;
pub mod transport;

pub use chat::{ChatStore, MemoryChatStore};
pub use registry::{Outbound, Registry, Room, RoomCommand};
pub use transport::{AppState, ws_handler};
