use crate::error::ClientError;
use crate::link::driver::{LinkDriver, LinkEvent, LinkFactory};
use crate::media::LocalMedia;
use async_trait::async_trait;
use huddle_core::{IceServerConfig, PeerId, SignalEnvelope};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_candidate::RTCIceCandidateInit;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

const PRESENCE_CHANNEL_LABEL: &str = "presence";

/// Builds one `RTCPeerConnection` per peer link, with the local tracks
/// attached and all callbacks wired into the orchestrator's event channel.
pub struct WebRtcLinkFactory {
    ice_servers: Vec<IceServerConfig>,
}

impl WebRtcLinkFactory {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self { ice_servers }
    }
}

#[async_trait]
impl LinkFactory for WebRtcLinkFactory {
    async fn create(
        &self,
        remote: PeerId,
        media: &LocalMedia,
        events: mpsc::Sender<(PeerId, LinkEvent)>,
    ) -> Result<Arc<dyn LinkDriver>, ClientError> {
        let driver = WebRtcLinkDriver::connect(remote, self.ice_servers.clone(), media, events)
            .await?;
        Ok(Arc::new(driver))
    }
}

pub struct WebRtcLinkDriver {
    remote: PeerId,
    pc: Arc<RTCPeerConnection>,
    presence_dc: Arc<Mutex<Option<Arc<RTCDataChannel>>>>,
    queued_presence: Arc<Mutex<Option<(bool, bool)>>>,
    events: mpsc::Sender<(PeerId, LinkEvent)>,
}

impl WebRtcLinkDriver {
    async fn connect(
        remote: PeerId,
        ice_servers: Vec<IceServerConfig>,
        media: &LocalMedia,
        events: mpsc::Sender<(PeerId, LinkEvent)>,
    ) -> Result<Self, ClientError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| ClientError::negotiation(&remote, e))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| ClientError::negotiation(&remote, e))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: ice_servers
                .into_iter()
                .map(|s| RTCIceServer {
                    urls: s.urls,
                    username: s.username.unwrap_or_default(),
                    credential: s.credential.unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| ClientError::negotiation(&remote, e))?,
        );

        for track in media.tracks() {
            pc.add_track(Arc::clone(track))
                .await
                .map_err(|e| ClientError::negotiation(&remote, e))?;
        }

        let presence_dc: Arc<Mutex<Option<Arc<RTCDataChannel>>>> = Arc::new(Mutex::new(None));
        let queued_presence: Arc<Mutex<Option<(bool, bool)>>> = Arc::new(Mutex::new(None));

        let state_events = events.clone();
        let state_remote = remote.clone();
        pc.on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
            let tx = state_events.clone();
            let remote = state_remote.clone();

            Box::pin(async move {
                info!("Peer connection state for {}: {:?}", remote, s);
                let event = match s {
                    RTCPeerConnectionState::Connected => LinkEvent::Connected,
                    RTCPeerConnectionState::Failed | RTCPeerConnectionState::Disconnected => {
                        LinkEvent::Failed(format!("peer connection {s:?}"))
                    }
                    RTCPeerConnectionState::Closed => LinkEvent::Closed,
                    _ => return,
                };
                let _ = tx.send((remote, event)).await;
            })
        }));

        let ice_events = events.clone();
        let ice_remote = remote.clone();
        pc.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_events.clone();
            let remote = ice_remote.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx
                    .send((
                        remote,
                        LinkEvent::IceCandidate {
                            candidate: init.candidate,
                            sdp_mid: init.sdp_mid,
                            sdp_m_line_index: init.sdp_mline_index,
                        },
                    ))
                    .await;
            })
        }));

        let track_events = events.clone();
        let track_remote = remote.clone();
        pc.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_events.clone();
                let remote = track_remote.clone();

                Box::pin(async move {
                    debug!("Remote track from {}: {}", remote, track.kind());
                    let _ = tx.send((remote, LinkEvent::RemoteTrack(track))).await;
                })
            },
        ));

        // Callee side: the caller created the presence channel; adopt it
        // when it shows up.
        let dc_slot = Arc::clone(&presence_dc);
        let dc_queue = Arc::clone(&queued_presence);
        let dc_events = events.clone();
        let dc_remote = remote.clone();
        pc.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let slot = Arc::clone(&dc_slot);
            let queue = Arc::clone(&dc_queue);
            let tx = dc_events.clone();
            let remote = dc_remote.clone();

            Box::pin(async move {
                if dc.label() != PRESENCE_CHANNEL_LABEL {
                    debug!("Ignoring unexpected data channel '{}'", dc.label());
                    return;
                }
                attach_presence_channel(&dc, remote, tx, queue);
                *slot.lock().await = Some(dc);
            })
        }));

        Ok(Self {
            remote,
            pc,
            presence_dc,
            queued_presence,
            events,
        })
    }
}

/// Wire up a presence channel: parse inbound updates, flush any queued
/// local state once the channel opens.
fn attach_presence_channel(
    dc: &Arc<RTCDataChannel>,
    remote: PeerId,
    events: mpsc::Sender<(PeerId, LinkEvent)>,
    queued: Arc<Mutex<Option<(bool, bool)>>>,
) {
    let open_dc = Arc::clone(dc);
    let open_remote = remote.clone();
    dc.on_open(Box::new(move || {
        let dc = open_dc.clone();
        let queued = Arc::clone(&queued);
        let remote = open_remote.clone();

        Box::pin(async move {
            debug!("Presence channel open for {}", remote);
            let flush = queued.lock().await.take();
            if let Some((mic_on, cam_on)) = flush {
                if let Err(e) = send_presence_on(&dc, mic_on, cam_on).await {
                    warn!("Failed to flush presence to {}: {}", remote, e);
                }
            }
        })
    }));

    let msg_remote = remote;
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = events.clone();
        let remote = msg_remote.clone();

        Box::pin(async move {
            let text = String::from_utf8_lossy(&msg.data);
            match serde_json::from_str::<SignalEnvelope>(&text) {
                Ok(SignalEnvelope::Presence { mic_on, cam_on }) => {
                    let _ = tx
                        .send((remote, LinkEvent::Presence { mic_on, cam_on }))
                        .await;
                }
                Ok(_) => debug!("Non-presence envelope on side channel from {}", remote),
                Err(e) => warn!("Invalid presence payload from {}: {}", remote, e),
            }
        })
    }));
}

async fn send_presence_on(
    dc: &Arc<RTCDataChannel>,
    mic_on: bool,
    cam_on: bool,
) -> Result<(), ClientError> {
    let json = serde_json::to_string(&SignalEnvelope::Presence { mic_on, cam_on })?;
    dc.send_text(json)
        .await
        .map_err(|e| ClientError::Transport(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl LinkDriver for WebRtcLinkDriver {
    async fn create_offer(&self) -> Result<String, ClientError> {
        let dc = self
            .pc
            .create_data_channel(PRESENCE_CHANNEL_LABEL, None)
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;

        attach_presence_channel(
            &dc,
            self.remote.clone(),
            self.events.clone(),
            Arc::clone(&self.queued_presence),
        );
        *self.presence_dc.lock().await = Some(dc);

        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;
        self.pc
            .set_local_description(offer.clone())
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;

        Ok(offer.sdp)
    }

    async fn accept_offer(&self, sdp: String) -> Result<String, ClientError> {
        let offer = RTCSessionDescription::offer(sdp)
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;
        self.pc
            .set_remote_description(offer)
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;

        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;
        self.pc
            .set_local_description(answer.clone())
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;

        Ok(answer.sdp)
    }

    async fn apply_answer(&self, sdp: String) -> Result<(), ClientError> {
        let answer = RTCSessionDescription::answer(sdp)
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;
        self.pc
            .set_remote_description(answer)
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;
        Ok(())
    }

    async fn add_ice_candidate(
        &self,
        candidate: String,
        sdp_mid: Option<String>,
        sdp_m_line_index: Option<u16>,
    ) -> Result<(), ClientError> {
        let init = RTCIceCandidateInit {
            candidate,
            sdp_mid,
            sdp_mline_index: sdp_m_line_index,
            username_fragment: None,
        };
        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| ClientError::negotiation(&self.remote, e))?;
        Ok(())
    }

    async fn send_presence(&self, mic_on: bool, cam_on: bool) -> Result<(), ClientError> {
        let dc = self.presence_dc.lock().await.clone();
        match dc {
            Some(dc) if dc.ready_state() == RTCDataChannelState::Open => {
                send_presence_on(&dc, mic_on, cam_on).await
            }
            _ => {
                // Channel not open yet; latest state wins and is flushed
                // on open.
                *self.queued_presence.lock().await = Some((mic_on, cam_on));
                Ok(())
            }
        }
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            debug!("Error closing connection to {}: {}", self.remote, e);
        }
    }
}
