use crate::link::driver::LinkDriver;
use huddle_core::{DisplayIdentity, PeerId};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Caller,
    Callee,
}

/// Per-pair negotiation states. `Errored` is reachable from any
/// non-terminal state; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    AwaitingLocalMedia,
    Negotiating(Role),
    Connected,
    Closed,
    Errored,
}

pub(crate) struct BufferedCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    pub sdp_m_line_index: Option<u16>,
}

/// State for one (local, remote) pair. Exactly one of these exists per
/// remote identity; the orchestrator owns and mutates it on its single
/// event-loop consumer.
pub struct PeerLink {
    pub(crate) remote: PeerId,
    pub(crate) display: DisplayIdentity,
    pub(crate) state: LinkState,
    pub(crate) driver: Option<Arc<dyn LinkDriver>>,
    pub(crate) remote_description_set: bool,
    pub(crate) buffered_candidates: Vec<BufferedCandidate>,
    pub(crate) attempts: u32,
}

impl PeerLink {
    pub(crate) fn new(remote: PeerId, display: DisplayIdentity, state: LinkState) -> Self {
        Self {
            remote,
            display,
            state,
            driver: None,
            remote_description_set: false,
            buffered_candidates: Vec::new(),
            attempts: 0,
        }
    }

    pub fn remote(&self) -> &PeerId {
        &self.remote
    }

    pub fn display(&self) -> &DisplayIdentity {
        &self.display
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Candidates that arrived before the remote description. They are
    /// flushed once the description is applied, never discarded.
    pub(crate) fn buffer_candidate(
        &mut self,
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) {
        self.buffered_candidates.push(BufferedCandidate {
            candidate,
            sdp_mid,
            sdp_m_line_index,
        });
    }

    pub(crate) fn take_buffered(&mut self) -> Vec<BufferedCandidate> {
        std::mem::take(&mut self.buffered_candidates)
    }

    /// Clear per-attempt negotiation state, keeping the attempt counter.
    pub(crate) fn reset_for_attempt(&mut self) -> Option<Arc<dyn LinkDriver>> {
        self.remote_description_set = false;
        self.buffered_candidates.clear();
        self.driver.take()
    }
}
