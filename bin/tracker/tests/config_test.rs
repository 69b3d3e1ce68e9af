//! integration tests for the tracker configuration

use core::time::Duration;

use multiproxy_tracker::config;

#[test]
fn base_configuration_loads() {
    let config = config::get_configuration().unwrap();

    assert_eq!(config.tracker.poll_interval, Duration::from_secs(6));
    assert_eq!(config.tracker.max_cycles, None);
    assert!(config.tracker.addresses.is_empty());
    assert_eq!(config.snapshot.path.to_str(), Some("./snapshot.json"));
    assert!(config.signer.local_addresses.is_empty());
}
