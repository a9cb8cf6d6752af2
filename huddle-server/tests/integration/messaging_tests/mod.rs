mod test_chat_broadcast_includes_sender;
mod test_chat_from_non_member_dropped;
mod test_chat_replay_for_late_joiner;
mod test_raise_hand_uses_display_label;
