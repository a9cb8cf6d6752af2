use huddle_core::{ServerFrame, SignalEnvelope};
use huddle_server::RoomCommand;

use crate::utils::TestMember;
use crate::{create_test_room, init_tracing};

#[tokio::test]
async fn test_signal_payload_is_opaque() {
    init_tracing();
    let room = create_test_room();

    let mut a = TestMember::join(&room, "a", "Ada").await;
    a.wait_for_roster().await;
    let mut b = TestMember::join(&room, "b", "Bea").await;
    b.wait_for_roster().await;

    // Candidate fields pass through byte-for-byte, no inspection.
    let envelope = SignalEnvelope::IceCandidate {
        candidate: "candidate:842163049 1 udp 1677729535 1.2.3.4 3478 typ srflx".to_string(),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
    };

    room.send(RoomCommand::Signal {
        from: b.peer.clone(),
        to: a.peer.clone(),
        envelope: envelope.clone(),
    })
    .await
    .unwrap();

    let frame = a
        .wait_for(|f| matches!(f, ServerFrame::Signal { .. }))
        .await;
    match frame {
        ServerFrame::Signal { from, envelope: got } => {
            assert_eq!(from, b.peer);
            assert_eq!(got, envelope);
        }
        _ => unreachable!(),
    }
}
