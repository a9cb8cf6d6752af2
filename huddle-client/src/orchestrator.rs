use crate::link::{LinkDriver, LinkEvent, LinkFactory, LinkState, PeerLink, Role};
use crate::media::LocalMedia;
use crate::presence::PresenceSync;
use crate::session::SessionEvent;
use crate::signal::SignalSink;
use huddle_core::{ClientFrame, DisplayIdentity, PeerId, RosterEntry, SignalEnvelope};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Wait after a roster event before placing the outbound call, to give
    /// the remote side a chance to finish initializing. Heuristic only:
    /// glare is still resolved deterministically.
    pub dial_grace: Duration,
    /// A negotiation attempt that has not connected by this deadline is
    /// treated as failed.
    pub negotiation_timeout: Duration,
    /// Total attempts per pair before the link is terminally closed.
    pub max_attempts: u32,
    /// First retry delay; doubles per attempt.
    pub retry_base: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dial_grace: Duration::from_millis(500),
            negotiation_timeout: Duration::from_secs(15),
            max_attempts: 3,
            retry_base: Duration::from_millis(500),
        }
    }
}

/// Timer events. Scheduled on the tokio timer and looped back into the
/// session event loop so every handler runs on the single consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    Dial(PeerId),
    NegotiationDeadline { peer: PeerId, attempt: u32 },
    Retry(PeerId),
}

/// Owns one `PeerLink` per remote identity and drives every negotiation:
/// queueing calls until local media is ready, answering inbound offers,
/// resolving glare, buffering early candidates, and retrying failures with
/// bounded backoff. All methods run on a single event-loop task, which is
/// what makes the pending-queue handoff atomic.
pub struct Orchestrator {
    local: PeerId,
    config: OrchestratorConfig,
    links: HashMap<PeerId, PeerLink>,
    pending_calls: VecDeque<RosterEntry>,
    media: Option<LocalMedia>,
    presence: PresenceSync,
    factory: Arc<dyn LinkFactory>,
    sink: Arc<dyn SignalSink>,
    link_events: mpsc::Sender<(PeerId, LinkEvent)>,
    ticks: mpsc::UnboundedSender<Tick>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local: PeerId,
        config: OrchestratorConfig,
        factory: Arc<dyn LinkFactory>,
        sink: Arc<dyn SignalSink>,
        link_events: mpsc::Sender<(PeerId, LinkEvent)>,
        ticks: mpsc::UnboundedSender<Tick>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            local,
            config,
            links: HashMap::new(),
            pending_calls: VecDeque::new(),
            media: None,
            presence: PresenceSync::new(),
            factory,
            sink,
            link_events,
            ticks,
            events,
        }
    }

    pub fn local(&self) -> &PeerId {
        &self.local
    }

    pub fn link_state(&self, peer: &PeerId) -> Option<LinkState> {
        self.links.get(peer).map(|l| l.state())
    }

    pub fn pending_call_count(&self) -> usize {
        self.pending_calls.len()
    }

    pub fn presence(&self) -> &PresenceSync {
        &self.presence
    }

    /// A roster event named a new remote identity. Idempotent: a repeat
    /// announcement for a known identity never spawns a second link.
    pub fn handle_new_participant(&mut self, entry: RosterEntry) {
        if entry.peer == self.local {
            return;
        }

        if let Some(link) = self.links.get_mut(&entry.peer) {
            debug!("Duplicate announcement for {}, ignoring", entry.peer);
            if link.display == DisplayIdentity::default() {
                link.display = entry.display;
            }
            return;
        }

        if self.media.is_some() {
            self.links.insert(
                entry.peer.clone(),
                PeerLink::new(entry.peer.clone(), entry.display, LinkState::Idle),
            );
            self.schedule(Tick::Dial(entry.peer), self.config.dial_grace);
        } else {
            info!("Queueing call to {} until local media is ready", entry.peer);
            self.links.insert(
                entry.peer.clone(),
                PeerLink::new(
                    entry.peer.clone(),
                    entry.display.clone(),
                    LinkState::AwaitingLocalMedia,
                ),
            );
            self.pending_calls.push_back(entry);
        }
    }

    /// Local capture finished. Drain every queued outbound intent; anything
    /// queued concurrently lands in `pending_calls` before this handler
    /// runs, so nothing is dropped or double-dialed.
    pub fn handle_media_ready(&mut self, media: LocalMedia) {
        info!(
            "Local media ready, draining {} pending calls",
            self.pending_calls.len()
        );
        self.media = Some(media);

        let mut to_dial = Vec::new();
        while let Some(entry) = self.pending_calls.pop_front() {
            if let Some(link) = self.links.get_mut(&entry.peer) {
                if link.state == LinkState::AwaitingLocalMedia {
                    link.state = LinkState::Idle;
                    to_dial.push(entry.peer);
                }
            }
        }

        for peer in to_dial {
            self.schedule(Tick::Dial(peer), self.config.dial_grace);
        }
    }

    pub async fn handle_tick(&mut self, tick: Tick) {
        match tick {
            Tick::Dial(peer) => self.dial(peer).await,

            Tick::NegotiationDeadline { peer, attempt } => {
                let stuck = self
                    .links
                    .get(&peer)
                    .is_some_and(|l| matches!(l.state, LinkState::Negotiating(_)) && l.attempts == attempt);
                if stuck {
                    self.fail_link(peer, "negotiation timed out".to_string())
                        .await;
                }
            }

            Tick::Retry(peer) => {
                let retryable = self
                    .links
                    .get_mut(&peer)
                    .filter(|l| l.state == LinkState::Errored)
                    .map(|l| l.state = LinkState::Idle)
                    .is_some();
                if retryable {
                    self.dial(peer).await;
                }
            }
        }
    }

    pub async fn handle_signal(&mut self, from: PeerId, envelope: SignalEnvelope) {
        match envelope {
            SignalEnvelope::Offer { sdp } => self.handle_offer(from, sdp).await,
            SignalEnvelope::Answer { sdp } => self.handle_answer(from, sdp).await,
            SignalEnvelope::IceCandidate {
                candidate,
                sdp_mid,
                sdp_m_line_index,
            } => {
                self.handle_candidate(from, candidate, sdp_mid, sdp_m_line_index)
                    .await
            }
            SignalEnvelope::Presence { mic_on, cam_on } => {
                self.note_remote_presence(from, mic_on, cam_on)
            }
        }
    }

    pub async fn handle_link_event(&mut self, peer: PeerId, event: LinkEvent) {
        debug!("Link event from {}: {}", peer, event.kind());

        match event {
            LinkEvent::Connected => self.handle_connected(peer).await,

            LinkEvent::RemoteTrack(track) => {
                let _ = self.events.send(SessionEvent::RemoteTrack { peer, track });
            }

            LinkEvent::IceCandidate {
                candidate,
                sdp_mid,
                sdp_m_line_index,
            } => {
                // Trickle our candidate out through the relay.
                let frame = ClientFrame::Signal {
                    to: peer.clone(),
                    envelope: SignalEnvelope::IceCandidate {
                        candidate,
                        sdp_mid,
                        sdp_m_line_index,
                    },
                };
                if let Err(e) = self.sink.send(frame).await {
                    warn!("Failed to send candidate to {}: {}", peer, e);
                }
            }

            LinkEvent::Presence { mic_on, cam_on } => {
                self.note_remote_presence(peer, mic_on, cam_on)
            }

            LinkEvent::Failed(reason) => self.fail_link(peer, reason).await,

            LinkEvent::Closed => {
                let closed = {
                    let Some(link) = self.links.get_mut(&peer) else {
                        return;
                    };
                    if link.state == LinkState::Closed {
                        return;
                    }
                    link.state = LinkState::Closed;
                    link.reset_for_attempt()
                };
                info!("Link to {} closed by remote", peer);
                if let Some(driver) = closed {
                    driver.close().await;
                }
                let _ = self.events.send(SessionEvent::PeerClosed { peer });
            }
        }
    }

    /// The remote identity disappeared from the roster; its link is torn
    /// down and destroyed.
    pub async fn handle_participant_left(&mut self, peer: PeerId) {
        self.presence.forget(&peer);
        self.pending_calls.retain(|e| e.peer != peer);

        let Some(mut link) = self.links.remove(&peer) else {
            return;
        };
        if let Some(driver) = link.driver.take() {
            driver.close().await;
        }
        info!("Tore down link to departed peer {}", peer);
        let _ = self.events.send(SessionEvent::PeerClosed { peer });
    }

    pub async fn set_mic(&mut self, on: bool) {
        self.presence.set_mic(on);
        self.broadcast_presence().await;
    }

    pub async fn set_cam(&mut self, on: bool) {
        self.presence.set_cam(on);
        self.broadcast_presence().await;
    }

    /// Orderly local teardown: every link first, then local media. The
    /// session closes the server channel afterwards, and the server-side
    /// disconnect broadcasts the leave to everyone else.
    pub async fn leave(&mut self) {
        for link in self.links.values_mut() {
            if let Some(driver) = link.driver.take() {
                driver.close().await;
            }
            link.state = LinkState::Closed;
        }
        self.links.clear();
        self.pending_calls.clear();
        self.media = None;
    }

    async fn dial(&mut self, peer: PeerId) {
        match self.links.get(&peer) {
            Some(link) if link.state == LinkState::Idle => {}
            // Glare may have flipped us to callee, or the peer left.
            _ => return,
        }

        let Some(media) = self.media.clone() else {
            // Media went away between scheduling and firing (local leave in
            // progress); drop the dial.
            return;
        };

        let driver = match self
            .factory
            .create(peer.clone(), &media, self.link_events.clone())
            .await
        {
            Ok(driver) => driver,
            Err(e) => {
                self.fail_link(peer, e.to_string()).await;
                return;
            }
        };

        let offer = match driver.create_offer().await {
            Ok(sdp) => sdp,
            Err(e) => {
                driver.close().await;
                self.fail_link(peer, e.to_string()).await;
                return;
            }
        };

        let frame = ClientFrame::Signal {
            to: peer.clone(),
            envelope: SignalEnvelope::Offer { sdp: offer },
        };
        if let Err(e) = self.sink.send(frame).await {
            driver.close().await;
            self.fail_link(peer, e.to_string()).await;
            return;
        }

        let attempt = {
            let Some(link) = self.links.get_mut(&peer) else {
                driver.close().await;
                return;
            };
            link.reset_for_attempt();
            link.driver = Some(driver);
            link.state = LinkState::Negotiating(Role::Caller);
            link.attempts += 1;
            link.attempts
        };
        info!("Calling {} (attempt {})", peer, attempt);

        self.schedule(
            Tick::NegotiationDeadline { peer, attempt },
            self.config.negotiation_timeout,
        );
    }

    async fn handle_offer(&mut self, from: PeerId, sdp: String) {
        if self.media.is_none() {
            // Only outbound intents queue. An offer landing before local
            // media is ready is rejected outright; the caller's bounded
            // retry covers recovery.
            warn!("Rejecting inbound call from {}: local media not ready", from);
            return;
        }

        if let Some(link) = self.links.get(&from) {
            if link.state == LinkState::Negotiating(Role::Caller) {
                if self.local < from {
                    info!("Glare with {}: yielding caller role", from);
                } else {
                    info!("Glare with {}: keeping caller role, ignoring offer", from);
                    return;
                }
            }
        }

        self.answer_offer(from, sdp).await;
    }

    async fn answer_offer(&mut self, from: PeerId, sdp: String) {
        let Some(media) = self.media.clone() else {
            return;
        };

        if !self.links.contains_key(&from) {
            // Inbound call arrived before the roster event for this peer.
            self.links.insert(
                from.clone(),
                PeerLink::new(from.clone(), DisplayIdentity::default(), LinkState::Idle),
            );
        }

        // Tear down whatever attempt was in flight for this pair.
        let old_driver = self
            .links
            .get_mut(&from)
            .and_then(|link| link.reset_for_attempt());
        if let Some(driver) = old_driver {
            driver.close().await;
        }

        let driver = match self
            .factory
            .create(from.clone(), &media, self.link_events.clone())
            .await
        {
            Ok(driver) => driver,
            Err(e) => {
                self.fail_link(from, e.to_string()).await;
                return;
            }
        };

        let answer = match driver.accept_offer(sdp).await {
            Ok(sdp) => sdp,
            Err(e) => {
                driver.close().await;
                self.fail_link(from, e.to_string()).await;
                return;
            }
        };

        let frame = ClientFrame::Signal {
            to: from.clone(),
            envelope: SignalEnvelope::Answer { sdp: answer },
        };
        if let Err(e) = self.sink.send(frame).await {
            driver.close().await;
            self.fail_link(from, e.to_string()).await;
            return;
        }

        let attempt = {
            let Some(link) = self.links.get_mut(&from) else {
                driver.close().await;
                return;
            };
            link.driver = Some(driver);
            link.remote_description_set = true;
            link.state = LinkState::Negotiating(Role::Callee);
            link.attempts += 1;
            link.attempts
        };
        info!("Answering call from {} (attempt {})", from, attempt);

        self.schedule(
            Tick::NegotiationDeadline {
                peer: from,
                attempt,
            },
            self.config.negotiation_timeout,
        );
    }

    async fn handle_answer(&mut self, from: PeerId, sdp: String) {
        let driver = {
            let Some(link) = self.links.get(&from) else {
                warn!("Answer from unknown peer {}", from);
                return;
            };
            if link.state != LinkState::Negotiating(Role::Caller) {
                warn!("Unexpected answer from {} in {:?}", from, link.state);
                return;
            }
            link.driver.clone()
        };
        let Some(driver) = driver else { return };

        if let Err(e) = driver.apply_answer(sdp).await {
            self.fail_link(from, e.to_string()).await;
            return;
        }

        // Remote description is in; flush candidates that arrived early.
        let buffered = {
            let Some(link) = self.links.get_mut(&from) else {
                return;
            };
            link.remote_description_set = true;
            link.take_buffered()
        };
        for c in buffered {
            if let Err(e) = driver
                .add_ice_candidate(c.candidate, c.sdp_mid, c.sdp_m_line_index)
                .await
            {
                warn!("Failed to add buffered candidate for {}: {}", from, e);
            }
        }
    }

    async fn handle_candidate(
        &mut self,
        from: PeerId,
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) {
        let driver = {
            let Some(link) = self.links.get_mut(&from) else {
                debug!("Candidate from unknown peer {}, dropping", from);
                return;
            };
            if !link.remote_description_set {
                link.buffer_candidate(candidate, sdp_mid, sdp_m_line_index);
                return;
            }
            link.driver.clone()
        };

        if let Some(driver) = driver {
            if let Err(e) = driver
                .add_ice_candidate(candidate, sdp_mid, sdp_m_line_index)
                .await
            {
                warn!("Failed to add candidate for {}: {}", from, e);
            }
        }
    }

    async fn handle_connected(&mut self, peer: PeerId) {
        let driver = {
            let Some(link) = self.links.get_mut(&peer) else {
                return;
            };
            if !matches!(link.state, LinkState::Negotiating(_)) {
                // Stale event from a superseded attempt.
                return;
            }
            link.state = LinkState::Connected;
            link.attempts = 0;
            link.driver.clone()
        };

        info!("Link to {} connected", peer);
        let _ = self.events.send(SessionEvent::PeerConnected {
            peer: peer.clone(),
        });

        // A late-connecting peer must see the current toggle state, not a
        // stale default.
        let state = self.presence.local();
        if let Some(driver) = driver {
            if let Err(e) = driver.send_presence(state.mic_on, state.cam_on).await {
                warn!("Failed to send presence to {}: {}", peer, e);
            }
        }
    }

    async fn fail_link(&mut self, peer: PeerId, reason: String) {
        let (driver, attempts, give_up) = {
            let Some(link) = self.links.get_mut(&peer) else {
                return;
            };
            if link.state == LinkState::Closed {
                return;
            }
            let driver = link.reset_for_attempt();
            let give_up = link.attempts >= self.config.max_attempts;
            link.state = if give_up {
                LinkState::Closed
            } else {
                LinkState::Errored
            };
            (driver, link.attempts, give_up)
        };

        warn!(
            "Link to {} failed after attempt {}: {}",
            peer, attempts, reason
        );
        if let Some(driver) = driver {
            driver.close().await;
        }

        if give_up {
            let _ = self.events.send(SessionEvent::PeerClosed {
                peer: peer.clone(),
            });
        } else {
            let delay = self.config.retry_base * 2u32.pow(attempts.saturating_sub(1));
            self.schedule(Tick::Retry(peer), delay);
        }
    }

    fn note_remote_presence(&mut self, peer: PeerId, mic_on: bool, cam_on: bool) {
        self.presence.note_remote(peer.clone(), mic_on, cam_on);
        let _ = self.events.send(SessionEvent::PeerPresence {
            peer,
            mic_on,
            cam_on,
        });
    }

    async fn broadcast_presence(&self) {
        let state = self.presence.local();
        let drivers: Vec<(PeerId, Arc<dyn LinkDriver>)> = self
            .links
            .values()
            .filter(|l| l.state == LinkState::Connected)
            .filter_map(|l| l.driver.clone().map(|d| (l.remote.clone(), d)))
            .collect();

        for (peer, driver) in drivers {
            if let Err(e) = driver.send_presence(state.mic_on, state.cam_on).await {
                warn!("Failed to send presence to {}: {}", peer, e);
            }
        }
    }

    fn schedule(&self, tick: Tick, delay: Duration) {
        let tx = self.ticks.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(tick);
        });
    }
}
