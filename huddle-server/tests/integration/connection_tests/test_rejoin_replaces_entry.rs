use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_rejoin_replaces_entry() {
    init_tracing();
    let room = create_test_room();

    let mut first = TestMember::join(&room, "a", "Ada").await;
    first.wait_for_roster().await;

    // Same peer id joins again on a fresh channel, as after a reconnect.
    let mut second = TestMember::join(&room, "a", "Ada").await;

    let roster = second.wait_for_roster().await;
    assert_eq!(roster.len(), 1, "rejoin must not duplicate the entry");
    assert_eq!(roster[0].peer, second.peer);
}
