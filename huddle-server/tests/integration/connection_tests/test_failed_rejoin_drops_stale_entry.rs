use huddle_core::{DisplayIdentity, ServerFrame};
use huddle_server::RoomCommand;
use tokio::sync::mpsc;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_failed_rejoin_drops_stale_entry() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    a.wait_for_chat().await; // own join notice

    // Stored history so the rejoin below has something to replay.
    room.send(RoomCommand::Chat {
        from: a.peer.clone(),
        text: "hi".to_string(),
    })
    .await
    .unwrap();
    a.wait_for_chat().await;

    let b = TestMember::join(&room, "b", "Bea").await;
    a.wait_for(|f| matches!(f, ServerFrame::NewParticipant { .. }))
        .await;

    // Bea reconnects but her new channel dies before the replay lands.
    let (outbound, dead_rx) = mpsc::unbounded_channel();
    drop(dead_rx);
    room.send(RoomCommand::Join {
        peer: b.peer.clone(),
        display: DisplayIdentity::new("Bea"),
        outbound,
    })
    .await
    .unwrap();

    // The remaining member must not be left with a stale roster: the
    // replaced entry's departure is broadcast like any other leave.
    let roster = a.wait_for_roster().await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].peer, a.peer);

    let notice = a.wait_for_chat().await;
    assert_eq!(notice.sender, "System");
    assert_eq!(notice.text, "Bea left the meeting.");

    let frame = a
        .wait_for(|f| matches!(f, ServerFrame::ParticipantLeft { .. }))
        .await;
    match frame {
        ServerFrame::ParticipantLeft { peer } => assert_eq!(peer, b.peer),
        _ => unreachable!(),
    }
}
