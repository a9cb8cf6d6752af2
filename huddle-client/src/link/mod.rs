mod driver;
mod peer_link;
mod webrtc_driver;

pub use driver::{LinkDriver, LinkEvent, LinkFactory, RemoteTrack};
pub use peer_link::{LinkState, PeerLink, Role};
pub use webrtc_driver::WebRtcLinkFactory;
