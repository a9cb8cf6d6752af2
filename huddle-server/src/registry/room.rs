use crate::chat::ChatStore;
use crate::registry::relay;
use crate::registry::room_command::{Outbound, RoomCommand};
use huddle_core::{ChatMessage, DisplayIdentity, MeetingId, PeerId, RosterEntry, ServerFrame};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

struct Member {
    display: DisplayIdentity,
    outbound: Outbound,
    seq: u64,
}

/// One meeting's event loop. Owns the authoritative membership set and
/// mutates it only here, so every mutation-then-broadcast sequence is
/// atomic with respect to the room's other events.
pub struct Room {
    meeting: MeetingId,
    members: HashMap<PeerId, Member>,
    next_seq: u64,
    had_member: bool,
    store: Arc<dyn ChatStore>,
    command_rx: mpsc::Receiver<RoomCommand>,
}

impl Room {
    pub fn new(
        meeting: MeetingId,
        store: Arc<dyn ChatStore>,
        command_rx: mpsc::Receiver<RoomCommand>,
    ) -> Self {
        Self {
            meeting,
            members: HashMap::new(),
            next_seq: 0,
            had_member: false,
            store,
            command_rx,
        }
    }

    /// Drive the room until its last member leaves. Commands that were
    /// already buffered behind the final departure are returned so the
    /// registry can route them to a fresh room instead of dropping them.
    pub async fn run(mut self) -> Vec<RoomCommand> {
        info!("Room {} event loop started", self.meeting);

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;

            if self.had_member && self.members.is_empty() {
                break;
            }
        }

        // Refuse new sends first so late dispatchers hit the dead-channel
        // retry, then collect whatever raced the shutdown into the buffer.
        self.command_rx.close();
        let mut leftovers = Vec::new();
        while let Ok(cmd) = self.command_rx.try_recv() {
            leftovers.push(cmd);
        }

        info!("Room {} event loop finished", self.meeting);
        leftovers
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                peer,
                display,
                outbound,
            } => self.handle_join(peer, display, outbound).await,

            RoomCommand::Chat { from, text } => self.handle_chat(from, text).await,

            RoomCommand::RaiseHand { from } => {
                let Some(member) = self.members.get(&from) else {
                    return;
                };
                let sender = member.display.label().to_string();
                self.broadcast(&ServerFrame::HandRaised { sender });
            }

            RoomCommand::Signal { from, to, envelope } => {
                relay::deliver(
                    self.members.get(&to).map(|m| &m.outbound),
                    from,
                    &to,
                    envelope,
                );
            }

            RoomCommand::Disconnect { peer } => self.handle_disconnect(peer).await,
        }
    }

    async fn handle_join(&mut self, peer: PeerId, display: DisplayIdentity, outbound: Outbound) {
        let replaced = self.members.remove(&peer).is_some();
        if replaced {
            info!("Peer {} rejoined room {}, replacing entry", peer, self.meeting);
        } else {
            info!("Peer {} joined room {}", peer, self.meeting);
        }

        // Chat replay goes to the joiner only, before any live traffic.
        for msg in self.store.read_all(&self.meeting).await {
            if outbound.send(ServerFrame::ChatMessage(msg)).is_err() {
                warn!("Joiner {} dropped during chat replay", peer);
                // A replaced entry is already gone and its old transport's
                // Disconnect will find nothing; everyone else must still
                // learn about the departure here.
                if replaced {
                    self.broadcast(&ServerFrame::ParticipantList {
                        participants: self.roster(),
                    });
                    self.broadcast(&ServerFrame::ChatMessage(ChatMessage {
                        sender: "System".to_string(),
                        text: format!("{} left the meeting.", display.label()),
                        timestamp_ms: now_ms(),
                    }));
                    self.broadcast(&ServerFrame::ParticipantLeft { peer });
                }
                return;
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.had_member = true;
        self.members.insert(
            peer.clone(),
            Member {
                display: display.clone(),
                outbound,
                seq,
            },
        );

        self.broadcast(&ServerFrame::ParticipantList {
            participants: self.roster(),
        });

        self.broadcast(&ServerFrame::ChatMessage(ChatMessage {
            sender: "System".to_string(),
            text: format!("{} joined the meeting.", display.label()),
            timestamp_ms: now_ms(),
        }));

        // Triggers outbound calls on every other member; the joiner must
        // not receive it.
        self.broadcast_except(
            &peer,
            &ServerFrame::NewParticipant {
                participant: RosterEntry {
                    peer: peer.clone(),
                    display,
                },
            },
        );
    }

    async fn handle_chat(&mut self, from: PeerId, text: String) {
        let Some(member) = self.members.get(&from) else {
            warn!("Chat from non-member {} in room {}", from, self.meeting);
            return;
        };

        let msg = ChatMessage {
            sender: member.display.label().to_string(),
            text,
            timestamp_ms: now_ms(),
        };

        self.store.append(&self.meeting, msg.clone()).await;

        // Verbatim fan-out to everyone, sender included, so the sender's
        // own view carries the server-assigned timestamp and ordering.
        self.broadcast(&ServerFrame::ChatMessage(msg));
    }

    async fn handle_disconnect(&mut self, peer: PeerId) {
        let Some(member) = self.members.remove(&peer) else {
            return;
        };

        info!("Peer {} left room {}", peer, self.meeting);

        self.broadcast(&ServerFrame::ParticipantList {
            participants: self.roster(),
        });

        self.broadcast(&ServerFrame::ChatMessage(ChatMessage {
            sender: "System".to_string(),
            text: format!("{} left the meeting.", member.display.label()),
            timestamp_ms: now_ms(),
        }));

        self.broadcast(&ServerFrame::ParticipantLeft { peer });
    }

    /// Current roster in join order.
    fn roster(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<_> = self.members.iter().collect();
        entries.sort_by_key(|(_, m)| m.seq);
        entries
            .into_iter()
            .map(|(peer, m)| RosterEntry {
                peer: peer.clone(),
                display: m.display.clone(),
            })
            .collect()
    }

    fn broadcast(&self, frame: &ServerFrame) {
        for (peer, member) in &self.members {
            if member.outbound.send(frame.clone()).is_err() {
                debug!("Dropped frame for {}: connection gone", peer);
            }
        }
    }

    fn broadcast_except(&self, skip: &PeerId, frame: &ServerFrame) {
        for (peer, member) in &self.members {
            if peer == skip {
                continue;
            }
            if member.outbound.send(frame.clone()).is_err() {
                debug!("Dropped frame for {}: connection gone", peer);
            }
        }
    }
}
