use huddle_core::{PeerId, SignalEnvelope};
use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_signal_to_missing_target_dropped() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    a.wait_for_chat().await; // own join notice

    room.send(RoomCommand::Signal {
        from: a.peer.clone(),
        to: PeerId::from("ghost"),
        envelope: SignalEnvelope::Offer {
            sdp: "v=0".to_string(),
        },
    })
    .await
    .unwrap();

    // Nothing comes back to the sender and the room stays functional.
    a.expect_silence().await;

    room.send(RoomCommand::Chat {
        from: a.peer.clone(),
        text: "still here".to_string(),
    })
    .await
    .unwrap();
    assert_eq!(a.wait_for_chat().await.text, "still here");
}
