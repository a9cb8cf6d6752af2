use crate::registry::{Outbound, Registry, RoomCommand};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientFrame, MeetingId, PeerId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub struct AppState {
    pub registry: Registry,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(peer_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let peer_id = PeerId::from(peer_id);

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, state))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, state: Arc<AppState>) {
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server frame: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let registry = state.registry.clone();
        let peer_id = peer_id.clone();

        async move {
            let mut joined: Option<MeetingId> = None;

            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientFrame>(&text) {
                        Ok(frame) => {
                            handle_frame(&registry, &peer_id, &tx, &mut joined, frame).await
                        }
                        Err(e) => warn!("Invalid frame from {}: {:?}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }

            // Socket gone, for whatever reason. This is the only leave
            // signal the registry ever gets.
            if let Some(meeting) = joined {
                registry
                    .dispatch(
                        &meeting,
                        RoomCommand::Disconnect {
                            peer: peer_id.clone(),
                        },
                    )
                    .await;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("WebSocket disconnected: {}", peer_id);
}

async fn handle_frame(
    registry: &Registry,
    peer_id: &PeerId,
    outbound: &Outbound,
    joined: &mut Option<MeetingId>,
    frame: ClientFrame,
) {
    match frame {
        ClientFrame::JoinMeeting { meeting, display } => {
            // A participant belongs to at most one room; switching rooms on
            // the same connection tears the old entry down first.
            if let Some(prev) = joined.take() {
                if prev != meeting {
                    registry
                        .dispatch(
                            &prev,
                            RoomCommand::Disconnect {
                                peer: peer_id.clone(),
                            },
                        )
                        .await;
                }
            }

            registry
                .dispatch(
                    &meeting,
                    RoomCommand::Join {
                        peer: peer_id.clone(),
                        display,
                        outbound: outbound.clone(),
                    },
                )
                .await;
            *joined = Some(meeting);
        }

        ClientFrame::ChatMessage { text } => match joined {
            Some(meeting) => {
                registry
                    .dispatch(
                        meeting,
                        RoomCommand::Chat {
                            from: peer_id.clone(),
                            text,
                        },
                    )
                    .await;
            }
            None => warn!("Chat from {} before join", peer_id),
        },

        ClientFrame::RaiseHand => match joined {
            Some(meeting) => {
                registry
                    .dispatch(
                        meeting,
                        RoomCommand::RaiseHand {
                            from: peer_id.clone(),
                        },
                    )
                    .await;
            }
            None => warn!("Raise-hand from {} before join", peer_id),
        },

        ClientFrame::Signal { to, envelope } => match joined {
            Some(meeting) => {
                registry
                    .dispatch(
                        meeting,
                        RoomCommand::Signal {
                            from: peer_id.clone(),
                            to,
                            envelope,
                        },
                    )
                    .await;
            }
            None => warn!("Signal from {} before join", peer_id),
        },
    }
}
