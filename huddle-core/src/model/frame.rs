use crate::model::chat::ChatMessage;
use crate::model::envelope::SignalEnvelope;
use crate::model::meeting::MeetingId;
use crate::model::participant::{DisplayIdentity, PeerId, RosterEntry};
use serde::{Deserialize, Serialize};

/// Frames sent from a client over its server channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientFrame {
    JoinMeeting {
        meeting: MeetingId,
        display: DisplayIdentity,
    },
    ChatMessage {
        text: String,
    },
    RaiseHand,
    Signal {
        to: PeerId,
        envelope: SignalEnvelope,
    },
}

/// Frames the registry pushes to room members.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerFrame {
    ParticipantList {
        participants: Vec<RosterEntry>,
    },
    NewParticipant {
        participant: RosterEntry,
    },
    ParticipantLeft {
        peer: PeerId,
    },
    ChatMessage(ChatMessage),
    HandRaised {
        sender: String,
    },
    Signal {
        from: PeerId,
        envelope: SignalEnvelope,
    },
}
