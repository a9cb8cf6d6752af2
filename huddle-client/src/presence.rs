use huddle_core::{PeerId, SignalEnvelope};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceState {
    pub mic_on: bool,
    pub cam_on: bool,
}

impl Default for PresenceState {
    fn default() -> Self {
        Self {
            mic_on: true,
            cam_on: true,
        }
    }
}

/// Local mic/camera toggle state plus the last state each remote reported.
/// Remote entries are UI-facing only; a remote's own track enablement is
/// never mutated from here.
#[derive(Default)]
pub struct PresenceSync {
    local: PresenceState,
    remote: HashMap<PeerId, PresenceState>,
}

impl PresenceSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local(&self) -> PresenceState {
        self.local
    }

    pub fn set_mic(&mut self, on: bool) {
        self.local.mic_on = on;
    }

    pub fn set_cam(&mut self, on: bool) {
        self.local.cam_on = on;
    }

    pub fn envelope(&self) -> SignalEnvelope {
        SignalEnvelope::Presence {
            mic_on: self.local.mic_on,
            cam_on: self.local.cam_on,
        }
    }

    pub fn note_remote(&mut self, peer: PeerId, mic_on: bool, cam_on: bool) {
        self.remote.insert(peer, PresenceState { mic_on, cam_on });
    }

    pub fn remote(&self, peer: &PeerId) -> Option<PresenceState> {
        self.remote.get(peer).copied()
    }

    pub fn forget(&mut self, peer: &PeerId) {
        self.remote.remove(peer);
    }
}
