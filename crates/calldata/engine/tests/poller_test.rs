//! integration tests for the poller

use core::time::Duration;

use multiproxy_calldata_domain::tx::TxStatus;
use multiproxy_calldata_engine::{
    CalldataEngineErrorKind, Poller, PollerConfig, TransactionMerger,
};
use multiproxy_test_utils::{MockChain, address, extrinsic_success, remark};

fn config(max_cycles: Option<u64>) -> PollerConfig {
    PollerConfig::builder()
        .interval(Duration::from_millis(1))
        .maybe_max_cycles(max_cycles)
        .build()
}

#[test]
fn default_interval_is_six_seconds() {
    let config = PollerConfig::builder().build();

    assert_eq!(config.interval(), Duration::from_secs(6));
    assert_eq!(config.max_cycles(), None);
    assert!(config.addresses().is_empty());
}

#[tokio::test]
async fn run_stops_after_the_configured_cycles() {
    // Arrange
    let chain = MockChain::new();
    let call = remark("polled");
    chain.submit(address(1), 3, 0, &call, vec![extrinsic_success()]);

    let mut poller = Poller::new(&chain, &chain, TransactionMerger::new(), config(Some(3)));

    // Act
    let cycles = poller.run(std::future::pending()).await;

    // Assert
    assert_eq!(cycles, 3);
    let store = poller.merger().store();
    assert_eq!(store.len(), 1);
    assert_eq!(store.by_hash(call.hash()).next().map(|tx| tx.status()), Some(TxStatus::Success));
}

#[tokio::test]
async fn failed_cycles_are_retried() {
    // Arrange
    let chain = MockChain::new();
    chain.submit(address(1), 3, 0, &remark("late"), vec![extrinsic_success()]);
    chain.fail_best_tx_queries(true);

    let mut poller = Poller::new(&chain, &chain, TransactionMerger::new(), config(Some(2)));

    // Act
    let cycles = poller.run(std::future::pending()).await;
    let err = poller.poll_once().await.unwrap_err();

    // Assert
    assert_eq!(cycles, 2);
    assert!(matches!(err.kind(), CalldataEngineErrorKind::Chain(_)));
    assert!(poller.merger().store().is_empty());

    chain.fail_best_tx_queries(false);
    let summary = poller.poll_once().await.unwrap();
    assert_eq!(summary.processed, 1);
}

#[tokio::test]
async fn shutdown_ends_the_loop() {
    let chain = MockChain::new();
    let config = PollerConfig::builder().interval(Duration::from_secs(3600)).build();
    let mut poller = Poller::new(&chain, &chain, TransactionMerger::new(), config);

    // the first tick fires at once, the second one only after the shutdown
    let cycles = poller.run(tokio::time::sleep(Duration::from_millis(20))).await;

    assert_eq!(cycles, 1);
}

#[tokio::test]
async fn only_watched_addresses_are_merged() {
    let chain = MockChain::new();
    let (watched, ignored) = (address(1), address(2));
    chain.submit(watched, 3, 0, &remark("mine"), vec![extrinsic_success()]);
    chain.submit(ignored, 3, 1, &remark("theirs"), vec![extrinsic_success()]);

    let config = PollerConfig::builder().addresses(vec![watched]).build();
    let mut poller = Poller::new(&chain, &chain, TransactionMerger::new(), config);

    let summary = poller.poll_once().await.unwrap();

    let merger = poller.into_merger();
    let senders = merger.store().iter().map(|tx| tx.sender()).collect::<Vec<_>>();
    assert_eq!(summary.processed, 1);
    assert_eq!(senders, vec![watched]);
}
