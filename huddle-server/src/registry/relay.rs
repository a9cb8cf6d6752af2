use crate::registry::room_command::Outbound;
use huddle_core::{PeerId, ServerFrame, SignalEnvelope};
use tracing::debug;

/// Deliver an envelope to the target's live connection, if any.
///
/// The relay never queues, never retries, and never inspects the envelope
/// kind. A missing target is a silent drop, not an error: the peer may have
/// disconnected a moment ago and the sender's orchestrator owns recovery.
pub(crate) fn deliver(
    target: Option<&Outbound>,
    from: PeerId,
    to: &PeerId,
    envelope: SignalEnvelope,
) {
    let Some(outbound) = target else {
        debug!("Relay miss: {} -> {} has no live connection", from, to);
        return;
    };

    let _ = outbound.send(ServerFrame::Signal { from, envelope });
}
