use huddle_core::{ServerFrame, SignalEnvelope};
use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_signal_routed_to_target_only() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    let mut b = TestMember::join(&room, "b", "Bea").await;
    b.wait_for_roster().await;
    let mut c = TestMember::join(&room, "c", "Cyd").await;
    c.wait_for_roster().await;
    c.wait_for_chat().await; // own join notice

    room.send(RoomCommand::Signal {
        from: a.peer.clone(),
        to: b.peer.clone(),
        envelope: SignalEnvelope::Offer {
            sdp: "v=0".to_string(),
        },
    })
    .await
    .unwrap();

    let frame = b
        .wait_for(|f| matches!(f, ServerFrame::Signal { .. }))
        .await;
    match frame {
        ServerFrame::Signal { from, envelope } => {
            assert_eq!(from, a.peer);
            assert_eq!(
                envelope,
                SignalEnvelope::Offer {
                    sdp: "v=0".to_string()
                }
            );
        }
        _ => unreachable!(),
    }

    // A third member never sees traffic addressed to someone else.
    c.expect_silence().await;
}
