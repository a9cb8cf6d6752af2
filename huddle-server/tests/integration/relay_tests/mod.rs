mod test_signal_payload_is_opaque;
mod test_signal_routed_to_target_only;
mod test_signal_to_missing_target_dropped;
