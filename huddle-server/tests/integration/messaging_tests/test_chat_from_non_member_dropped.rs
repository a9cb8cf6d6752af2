use huddle_core::PeerId;
use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_chat_from_non_member_dropped() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    a.wait_for_chat().await; // own join notice

    room.send(RoomCommand::Chat {
        from: PeerId::from("ghost"),
        text: "boo".to_string(),
    })
    .await
    .unwrap();

    a.expect_silence().await;
}
