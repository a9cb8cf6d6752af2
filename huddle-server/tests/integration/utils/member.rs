use huddle_core::{ChatMessage, DisplayIdentity, PeerId, RosterEntry, ServerFrame};
use huddle_server::RoomCommand;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// One simulated room member: a peer identity plus the outbound channel
/// the room pushes frames into.
pub struct TestMember {
    pub peer: PeerId,
    pub rx: mpsc::UnboundedReceiver<ServerFrame>,
}

impl TestMember {
    /// Join the room under the given id and display name.
    pub async fn join(room: &mpsc::Sender<RoomCommand>, id: &str, name: &str) -> Self {
        let peer = PeerId::from(id);
        let (outbound, rx) = mpsc::unbounded_channel();
        room.send(RoomCommand::Join {
            peer: peer.clone(),
            display: DisplayIdentity::new(name),
            outbound,
        })
        .await
        .expect("room command channel closed");

        Self { peer, rx }
    }

    pub async fn next_frame(&mut self) -> ServerFrame {
        timeout(RECV_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for frame")
            .expect("outbound channel closed")
    }

    /// Skip frames until one satisfies the predicate.
    pub async fn wait_for<F>(&mut self, mut pred: F) -> ServerFrame
    where
        F: FnMut(&ServerFrame) -> bool,
    {
        loop {
            let frame = self.next_frame().await;
            if pred(&frame) {
                return frame;
            }
        }
    }

    pub async fn wait_for_roster(&mut self) -> Vec<RosterEntry> {
        match self
            .wait_for(|f| matches!(f, ServerFrame::ParticipantList { .. }))
            .await
        {
            ServerFrame::ParticipantList { participants } => participants,
            _ => unreachable!(),
        }
    }

    pub async fn wait_for_chat(&mut self) -> ChatMessage {
        match self
            .wait_for(|f| matches!(f, ServerFrame::ChatMessage(_)))
            .await
        {
            ServerFrame::ChatMessage(msg) => msg,
            _ => unreachable!(),
        }
    }

    /// Assert nothing arrives within a short window.
    pub async fn expect_silence(&mut self) {
        let got = timeout(Duration::from_millis(200), self.rx.recv()).await;
        if let Ok(Some(frame)) = got {
            panic!("expected no frame, got {frame:?}");
        }
    }
}
