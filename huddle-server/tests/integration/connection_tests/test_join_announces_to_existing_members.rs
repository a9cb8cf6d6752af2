use huddle_core::ServerFrame;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_join_announces_to_existing_members() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;

    let mut b = TestMember::join(&room, "b", "Bea").await;

    // Existing member sees the refreshed roster and the announcement that
    // triggers its outbound call.
    let roster = a.wait_for_roster().await;
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].peer, a.peer);
    assert_eq!(roster[1].peer, b.peer);

    let announced = a
        .wait_for(|f| matches!(f, ServerFrame::NewParticipant { .. }))
        .await;
    match announced {
        ServerFrame::NewParticipant { participant } => {
            assert_eq!(participant.peer, b.peer);
            assert_eq!(participant.display.label(), "Bea");
        }
        _ => unreachable!(),
    }

    // The joiner gets the same snapshot.
    let roster = b.wait_for_roster().await;
    assert_eq!(roster.len(), 2);
}
