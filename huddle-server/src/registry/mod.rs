mod registry;
mod relay;
mod room;
mod room_command;

pub use registry::Registry;
pub use room::Room;
pub use room_command::{Outbound, RoomCommand};
