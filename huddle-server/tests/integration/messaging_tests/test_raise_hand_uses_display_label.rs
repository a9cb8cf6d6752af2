use huddle_core::ServerFrame;
use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_raise_hand_uses_display_label() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    let mut b = TestMember::join(&room, "b", "Bea").await;
    b.wait_for_roster().await;

    room.send(RoomCommand::RaiseHand {
        from: b.peer.clone(),
    })
    .await
    .unwrap();

    // Everyone, raiser included, sees the display label.
    for member in [&mut a, &mut b] {
        let frame = member
            .wait_for(|f| matches!(f, ServerFrame::HandRaised { .. }))
            .await;
        match frame {
            ServerFrame::HandRaised { sender } => assert_eq!(sender, "Bea"),
            _ => unreachable!(),
        }
    }
}
