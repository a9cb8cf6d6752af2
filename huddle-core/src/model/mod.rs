mod chat;
mod envelope;
mod frame;
mod ice;
mod meeting;
mod participant;

pub use chat::ChatMessage;
pub use envelope::SignalEnvelope;
pub use frame::{ClientFrame, ServerFrame};
pub use ice::IceServerConfig;
pub use meeting::MeetingId;
pub use participant::{DisplayIdentity, PeerId, RosterEntry};
