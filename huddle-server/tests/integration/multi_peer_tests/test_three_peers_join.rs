use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_three_peers_join() {
    init_tracing();
    let room = create_test_room();

    let a = TestMember::join(&room, "a", "Ada").await;
    let b = TestMember::join(&room, "b", "Bea").await;
    let mut c = TestMember::join(&room, "c", "Cyd").await;

    // The last joiner's snapshot lists everyone in join order.
    let roster = c.wait_for_roster().await;
    assert_eq!(roster.len(), 3);
    assert_eq!(roster[0].peer, a.peer);
    assert_eq!(roster[1].peer, b.peer);
    assert_eq!(roster[2].peer, c.peer);
    assert_eq!(
        roster.iter().map(|e| e.display.label()).collect::<Vec<_>>(),
        vec!["Ada", "Bea", "Cyd"]
    );
}
