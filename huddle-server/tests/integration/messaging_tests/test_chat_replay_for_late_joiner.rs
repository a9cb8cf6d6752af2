use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_chat_replay_for_late_joiner() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;

    for text in ["first", "second"] {
        room.send(RoomCommand::Chat {
            from: a.peer.clone(),
            text: text.to_string(),
        })
        .await
        .unwrap();
    }

    let mut b = TestMember::join(&room, "b", "Bea").await;

    // History lands before any live traffic, in send order.
    let replayed = b.wait_for_chat().await;
    assert_eq!(replayed.text, "first");
    let replayed = b.wait_for_chat().await;
    assert_eq!(replayed.text, "second");

    // Only then the roster snapshot.
    let roster = b.wait_for_roster().await;
    assert_eq!(roster.len(), 2);
}
