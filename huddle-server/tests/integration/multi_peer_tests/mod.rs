mod test_abrupt_disconnect_broadcasts_departure;
mod test_three_peers_join;
