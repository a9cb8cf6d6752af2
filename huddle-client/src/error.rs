use huddle_core::PeerId;
use thiserror::Error;

/// Client-side error taxonomy. Negotiation failures stay scoped to one
/// peer pair; transport failures cover the server channel; media
/// acquisition failures are fatal to starting a session.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("negotiation with {peer} failed: {reason}")]
    Negotiation { peer: PeerId, reason: String },

    #[error("media acquisition failed: {0}")]
    MediaAcquisition(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn negotiation(peer: &PeerId, reason: impl ToString) -> Self {
        Self::Negotiation {
            peer: peer.clone(),
            reason: reason.to_string(),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
