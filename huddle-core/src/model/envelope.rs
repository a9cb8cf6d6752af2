use serde::{Deserialize, Serialize};

/// Handshake payload exchanged between two peer orchestrators. The relay
/// forwards envelopes without ever branching on the kind; the closed
/// variant set exists so the client state machine stays exhaustively
/// checkable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SignalEnvelope {
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    IceCandidate {
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    },
    Presence {
        mic_on: bool,
        cam_on: bool,
    },
}
