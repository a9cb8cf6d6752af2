use crate::error::ClientError;
use crate::media::LocalMedia;
use async_trait::async_trait;
use huddle_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;

pub type RemoteTrack = Arc<webrtc::track::track_remote::TrackRemote>;

/// Events a link driver reports back into the orchestrator's event loop,
/// tagged with the remote peer they belong to at the channel level.
#[derive(Clone)]
pub enum LinkEvent {
    /// The underlying connection reached a connected state.
    Connected,
    /// A remote media track arrived.
    RemoteTrack(RemoteTrack),
    /// A locally gathered ICE candidate to trickle to the remote.
    IceCandidate {
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    },
    /// A presence update received on the side channel.
    Presence { mic_on: bool, cam_on: bool },
    /// The connection failed or was lost.
    Failed(String),
    /// The remote closed the connection cleanly.
    Closed,
}

impl LinkEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LinkEvent::Connected => "connected",
            LinkEvent::RemoteTrack(_) => "remote-track",
            LinkEvent::IceCandidate { .. } => "ice-candidate",
            LinkEvent::Presence { .. } => "presence",
            LinkEvent::Failed(_) => "failed",
            LinkEvent::Closed => "closed",
        }
    }
}

/// One negotiation attempt's connection object. The orchestrator drives it;
/// it reports back through the event channel it was created with.
#[async_trait]
pub trait LinkDriver: Send + Sync {
    /// Create the local offer (and the presence side channel) as caller.
    async fn create_offer(&self) -> Result<String, ClientError>;

    /// Apply a remote offer and produce the answer, as callee.
    async fn accept_offer(&self, sdp: String) -> Result<String, ClientError>;

    /// Apply the remote answer to a previously created offer.
    async fn apply_answer(&self, sdp: String) -> Result<(), ClientError>;

    async fn add_ice_candidate(
        &self,
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) -> Result<(), ClientError>;

    /// Send a presence update over the side channel. Queued until the
    /// channel opens if necessary.
    async fn send_presence(&self, mic_on: bool, cam_on: bool) -> Result<(), ClientError>;

    async fn close(&self);
}

#[async_trait]
pub trait LinkFactory: Send + Sync {
    async fn create(
        &self,
        remote: PeerId,
        media: &LocalMedia,
        events: mpsc::Sender<(PeerId, LinkEvent)>,
    ) -> Result<Arc<dyn LinkDriver>, ClientError>;
}
