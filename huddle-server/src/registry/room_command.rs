use huddle_core::{DisplayIdentity, PeerId, ServerFrame, SignalEnvelope};
use tokio::sync::mpsc;

/// Outbound half of a member's server channel. The transport task owns the
/// receiving side and serializes frames onto the wire.
pub type Outbound = mpsc::UnboundedSender<ServerFrame>;

/// Commands entering a room's event loop. One receiver per room, so all of
/// a room's events are processed serially while rooms stay independent.
#[derive(Debug)]
pub enum RoomCommand {
    /// A connection announced intent to join. Idempotent per peer id: a
    /// duplicate join replaces the prior entry.
    Join {
        peer: PeerId,
        display: DisplayIdentity,
        outbound: Outbound,
    },

    Chat {
        from: PeerId,
        text: String,
    },

    RaiseHand {
        from: PeerId,
    },

    /// Opaque signaling envelope to pass through to one member.
    Signal {
        from: PeerId,
        to: PeerId,
        envelope: SignalEnvelope,
    },

    /// Transport-level disconnect. There is no explicit leave frame.
    Disconnect {
        peer: PeerId,
    },
}
