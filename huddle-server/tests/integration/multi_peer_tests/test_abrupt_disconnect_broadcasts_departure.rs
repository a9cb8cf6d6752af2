use huddle_core::ServerFrame;
use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_abrupt_disconnect_broadcasts_departure() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    a.wait_for_chat().await; // own join notice
    let b = TestMember::join(&room, "b", "Bea").await;
    a.wait_for_roster().await;
    a.wait_for_chat().await; // Bea's join notice
    a.wait_for(|f| matches!(f, ServerFrame::NewParticipant { .. }))
        .await;

    // Socket loss with no goodbye: the channel consumer reports it.
    drop(b.rx);
    room.send(RoomCommand::Disconnect {
        peer: b.peer.clone(),
    })
    .await
    .unwrap();

    // Remaining member sees snapshot, system notice, then the departure.
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
