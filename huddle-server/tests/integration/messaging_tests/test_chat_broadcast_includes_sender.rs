use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_chat_broadcast_includes_sender() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    a.wait_for_chat().await; // own join notice

    let mut b = TestMember::join(&room, "b", "Bea").await;
    b.wait_for_roster().await;
    b.wait_for_chat().await; // own join notice
    a.wait_for_roster().await;
    a.wait_for_chat().await; // Bea's join notice

    room.send(RoomCommand::Chat {
        from: a.peer.clone(),
        text: "hello".to_string(),
    })
    .await
    .unwrap();

    // Both members receive the same stamped message, the sender included.
    let seen_by_a = a.wait_for_chat().await;
    let seen_by_b = b.wait_for_chat().await;
    assert_eq!(seen_by_a, seen_by_b);
    assert_eq!(seen_by_a.sender, "Ada");
    assert_eq!(seen_by_a.text, "hello");
    assert!(seen_by_a.timestamp_ms > 0);
}
