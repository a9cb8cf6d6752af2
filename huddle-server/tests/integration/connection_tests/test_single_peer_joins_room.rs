use huddle_core::ServerFrame;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_single_peer_joins_room() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;

    // First frame after a fresh join is the roster snapshot.
    let roster = a.wait_for_roster().await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].peer, a.peer);
    assert_eq!(roster[0].display.label(), "Ada");

    // Followed by the system join notice.
    let notice = a.wait_for_chat().await;
    assert_eq!(notice.sender, "System");
    assert_eq!(notice.text, "Ada joined the meeting.");

    // The joiner never sees an announcement for itself.
    let unexpected = tokio::time::timeout(std::time::Duration::from_millis(200), async {
        a.wait_for(|f| matches!(f, ServerFrame::NewParticipant { .. }))
            .await
    })
    .await;
    assert!(unexpected.is_err(), "joiner received its own announcement");
}
