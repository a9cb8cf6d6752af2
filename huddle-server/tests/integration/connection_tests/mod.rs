mod test_failed_rejoin_drops_stale_entry;
mod test_join_announces_to_existing_members;
mod test_rejoin_replaces_entry;
mod test_single_peer_joins_room;
