pub mod error;
pub mod link;
pub mod media;
pub mod orchestrator;
pub mod presence;
pub mod session;
pub mod signal;

pub use error::ClientError;
pub use link::{LinkDriver, LinkEvent, LinkFactory, LinkState, Role, WebRtcLinkFactory};
pub use media::{LocalMedia, LocalTrack, MediaSource, StaticMediaSource};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use presence::{PresenceState, PresenceSync};
pub use session::{MeetingSession, SessionConfig, SessionEvent};
pub use signal::SignalSink;
