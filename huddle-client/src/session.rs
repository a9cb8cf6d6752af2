use crate::error::ClientError;
use crate::link::{LinkEvent, RemoteTrack, WebRtcLinkFactory};
use crate::media::MediaSource;
use crate::orchestrator::{Orchestrator, OrchestratorConfig, Tick};
use crate::signal::SignalSink;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::{
    ChatMessage, ClientFrame, DisplayIdentity, IceServerConfig, MeetingId, PeerId, RosterEntry,
    ServerFrame,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base websocket URL of the registry, e.g. `ws://localhost:4000`.
    pub server_url: String,
    pub meeting: MeetingId,
    pub peer_id: PeerId,
    pub display: DisplayIdentity,
    pub ice_servers: Vec<IceServerConfig>,
    pub orchestrator: OrchestratorConfig,
}

impl SessionConfig {
    pub fn new(server_url: impl Into<String>, meeting: MeetingId, display: DisplayIdentity) -> Self {
        Self {
            server_url: server_url.into(),
            meeting,
            peer_id: PeerId::random(),
            display,
            ice_servers: vec![IceServerConfig::stun("stun:stun.l.google.com:19302")],
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

/// Everything the embedder observes about a running session.
pub enum SessionEvent {
    /// Authoritative roster snapshot from the registry.
    Roster(Vec<RosterEntry>),
    Chat(ChatMessage),
    HandRaised { sender: String },
    PeerConnected { peer: PeerId },
    RemoteTrack { peer: PeerId, track: RemoteTrack },
    PeerPresence { peer: PeerId, mic_on: bool, cam_on: bool },
    PeerClosed { peer: PeerId },
    /// The session cannot continue (server channel lost, media denied).
    Fatal(ClientError),
}

enum SessionCommand {
    Chat(String),
    RaiseHand,
    SetMic(bool),
    SetCam(bool),
    Leave,
}

/// `SignalSink` over the websocket writer task's queue.
struct WsSink {
    tx: mpsc::UnboundedSender<Message>,
}

#[async_trait]
impl SignalSink for WsSink {
    async fn send(&self, frame: ClientFrame) -> Result<(), ClientError> {
        let json = serde_json::to_string(&frame)?;
        self.tx
            .send(Message::Text(json))
            .map_err(|_| ClientError::Transport("server channel closed".to_string()))
    }
}

/// Handle to a joined meeting. Events are consumed from `next_event`;
/// dropping the handle (or calling `leave`) tears the session down.
pub struct MeetingSession {
    peer_id: PeerId,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl MeetingSession {
    /// Connect to the registry, announce the join, and start capturing
    /// local media in the background. Existing members call the newcomer;
    /// outbound calls of our own queue until capture finishes.
    pub async fn join(
        config: SessionConfig,
        media_source: Arc<dyn MediaSource>,
    ) -> Result<Self, ClientError> {
        let url = format!("{}/ws/{}", config.server_url, config.peer_id);
        info!("Connecting to {}", url);
        let (ws, _) = connect_async(url.as_str()).await?;
        let (mut ws_write, mut ws_read) = ws.split();

        // Writer task: serialize order is the queue order.
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if let Err(e) = ws_write.send(msg).await {
                    warn!("Websocket send failed: {}", e);
                    break;
                }
            }
            let _ = ws_write.close().await;
        });

        // Reader task: frames land on the session event loop.
        let (frame_tx, frame_rx) = mpsc::unbounded_channel::<ServerFrame>();
        tokio::spawn(async move {
            while let Some(msg) = ws_read.next().await {
                match msg {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => {
                            if frame_tx.send(frame).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Unparseable server frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Websocket read failed: {}", e);
                        break;
                    }
                }
            }
        });

        let sink: Arc<dyn SignalSink> = Arc::new(WsSink { tx: out_tx });
        sink.send(ClientFrame::JoinMeeting {
            meeting: config.meeting.clone(),
            display: config.display.clone(),
        })
        .await?;

        let (link_tx, link_rx) = mpsc::channel::<(PeerId, LinkEvent)>(64);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel::<Tick>();
        let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
        let (command_tx, command_rx) = mpsc::unbounded_channel::<SessionCommand>();

        let factory = Arc::new(WebRtcLinkFactory::new(config.ice_servers.clone()));
        let orchestrator = Orchestrator::new(
            config.peer_id.clone(),
            config.orchestrator.clone(),
            factory,
            Arc::clone(&sink),
            link_tx,
            tick_tx,
            event_tx.clone(),
        );

        // Capture runs off the loop so signaling is live immediately.
        let (media_tx, media_rx) = oneshot::channel();
        tokio::spawn(async move {
            let _ = media_tx.send(media_source.acquire().await);
        });

        let peer_id = config.peer_id.clone();
        tokio::spawn(run_loop(
            orchestrator,
            sink,
            event_tx,
            frame_rx,
            link_rx,
            tick_rx,
            command_rx,
            media_rx,
        ));

        Ok(Self {
            peer_id,
            events: event_rx,
            commands: command_tx,
        })
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Next session event. `None` after the session has shut down.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn send_chat(&self, text: impl Into<String>) {
        let _ = self.commands.send(SessionCommand::Chat(text.into()));
    }

    pub fn raise_hand(&self) {
        let _ = self.commands.send(SessionCommand::RaiseHand);
    }

    pub fn set_mic(&self, on: bool) {
        let _ = self.commands.send(SessionCommand::SetMic(on));
    }

    pub fn set_cam(&self, on: bool) {
        let _ = self.commands.send(SessionCommand::SetCam(on));
    }

    pub fn leave(&self) {
        let _ = self.commands.send(SessionCommand::Leave);
    }
}

/// Single consumer for everything that mutates session state: server
/// frames, link events, timer ticks, embedder commands, and the media
/// handoff. The orchestrator is only ever touched from here.
#[allow(clippy::too_many_arguments)]
async fn run_loop(
    mut orchestrator: Orchestrator,
    sink: Arc<dyn SignalSink>,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut frames: mpsc::UnboundedReceiver<ServerFrame>,
    mut link_events: mpsc::Receiver<(PeerId, LinkEvent)>,
    mut ticks: mpsc::UnboundedReceiver<Tick>,
    mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    mut media: oneshot::Receiver<Result<crate::media::LocalMedia, ClientError>>,
) {
    let mut media_pending = true;

    loop {
        tokio::select! {
            result = &mut media, if media_pending => {
                media_pending = false;
                match result {
                    Ok(Ok(local)) => orchestrator.handle_media_ready(local),
                    Ok(Err(e)) => {
                        let _ = events.send(SessionEvent::Fatal(e));
                        break;
                    }
                    Err(_) => {
                        let _ = events.send(SessionEvent::Fatal(
                            ClientError::MediaAcquisition("capture task dropped".to_string()),
                        ));
                        break;
                    }
                }
            }

            frame = frames.recv() => {
                let Some(frame) = frame else {
                    let _ = events.send(SessionEvent::Fatal(ClientError::Transport(
                        "server channel closed".to_string(),
                    )));
                    break;
                };
                handle_server_frame(&mut orchestrator, &events, frame).await;
            }

            event = link_events.recv() => {
                if let Some((peer, event)) = event {
                    orchestrator.handle_link_event(peer, event).await;
                }
            }

            tick = ticks.recv() => {
                if let Some(tick) = tick {
                    orchestrator.handle_tick(tick).await;
                }
            }

            command = commands.recv() => {
                match command {
                    Some(SessionCommand::Chat(text)) => {
                        if let Err(e) = sink.send(ClientFrame::ChatMessage { text }).await {
                            warn!("Failed to send chat: {}", e);
                        }
                    }
                    Some(SessionCommand::RaiseHand) => {
                        if let Err(e) = sink.send(ClientFrame::RaiseHand).await {
                            warn!("Failed to raise hand: {}", e);
                        }
                    }
                    Some(SessionCommand::SetMic(on)) => orchestrator.set_mic(on).await,
                    Some(SessionCommand::SetCam(on)) => orchestrator.set_cam(on).await,
                    Some(SessionCommand::Leave) | None => {
                        orchestrator.leave().await;
                        break;
                    }
                }
            }
        }
    }
    debug!("Session loop for {} exited", orchestrator.local());
    // Dropping the sink's last clone closes the writer task, which closes
    // the websocket; the registry handles the rest of the departure.
}

async fn handle_server_frame(
    orchestrator: &mut Orchestrator,
    events: &mpsc::UnboundedSender<SessionEvent>,
    frame: ServerFrame,
) {
    match frame {
        ServerFrame::ParticipantList { participants } => {
            // Informational only. Existing members call the newcomer when
            // its announcement reaches them; the newcomer answers. Dialing
            // from the snapshot too would put every pair into glare.
            let _ = events.send(SessionEvent::Roster(participants));
        }
        ServerFrame::NewParticipant { participant } => {
            orchestrator.handle_new_participant(participant);
        }
        ServerFrame::ParticipantLeft { peer } => {
            orchestrator.handle_participant_left(peer).await;
        }
        ServerFrame::ChatMessage(message) => {
            let _ = events.send(SessionEvent::Chat(message));
        }
        ServerFrame::HandRaised { sender } => {
            let _ = events.send(SessionEvent::HandRaised { sender });
        }
        ServerFrame::Signal { from, envelope } => {
            orchestrator.handle_signal(from, envelope).await;
        }
    }
}
