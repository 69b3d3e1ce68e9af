//! integration tests for the status classifier

use multiproxy_calldata_domain::{
    event::{ChainEvent, EventRecord, Phase},
    tx::TxStatus,
};
use multiproxy_calldata_engine::{
    ChainError, HopStatus, ProxyEventCursor, classify_multisig, classify_proxy,
};
use multiproxy_test_utils::{
    MockChain, address, block_hash, dispatch_error, multisig, multisig_approval, multisig_executed,
    new_multisig, ok, proxy_executed, remark, timepoint,
};

fn records(events: Vec<ChainEvent>) -> Vec<EventRecord> {
    events.into_iter().map(|event| EventRecord::new(Phase::ApplyExtrinsic(1), event)).collect()
}

#[test]
fn proxy_events_are_handed_out_last_first() {
    let events = records(vec![
        proxy_executed(dispatch_error("inner")),
        proxy_executed(ok()),
    ]);
    let mut cursor = ProxyEventCursor::new(&events);
    assert_eq!(cursor.remaining(), 2);

    // the outermost proxy hop owns the last event
    assert_eq!(classify_proxy(&mut cursor, 10, 1), HopStatus::at(TxStatus::Success, 10, 1));
    assert_eq!(cursor.remaining(), 1);

    assert_eq!(classify_proxy(&mut cursor, 10, 1), HopStatus::at(TxStatus::Failed, 10, 1));
    assert_eq!(cursor.remaining(), 0);

    // no event left
    assert_eq!(classify_proxy(&mut cursor, 10, 1), HopStatus::new(TxStatus::Initialized));
}

#[test]
fn proxy_cursor_skips_unrelated_events() {
    let ms = multisig(&[address(1), address(2)], 2);
    let events = records(vec![
        proxy_executed(ok()),
        new_multisig(address(1), ms, remark("x").hash()),
        ChainEvent::ExtrinsicSuccess,
    ]);
    let mut cursor = ProxyEventCursor::new(&events);

    assert_eq!(cursor.take_last(), Some(&ok()));
    assert_eq!(cursor.take_last(), None);
}

#[tokio::test]
async fn multisig_executed_takes_priority_over_approval() {
    // Arrange
    let chain = MockChain::new();
    let ms = multisig(&[address(1), address(2)], 2);
    let hash = remark("pay").hash();
    let events = records(vec![
        multisig_approval(address(2), timepoint(5, 2), ms, hash),
        multisig_executed(address(2), timepoint(5, 2), ms, hash, ok()),
    ]);

    // Act
    let status = classify_multisig(&chain, &events, ms, hash, block_hash(9)).await.unwrap();

    // Assert
    assert_eq!(status, HopStatus::at(TxStatus::Success, 5, 2));
    assert_eq!(chain.storage_queries(), 0);
}

#[tokio::test]
async fn multisig_executed_with_failed_dispatch_is_failed_at_origin_timepoint() {
    let chain = MockChain::new();
    let ms = multisig(&[address(1), address(2)], 2);
    let hash = remark("pay").hash();
    let executed = multisig_executed(address(1), timepoint(3, 7), ms, hash, dispatch_error("x"));
    let events = records(vec![executed]);

    let status = classify_multisig(&chain, &events, ms, hash, block_hash(9)).await.unwrap();

    assert_eq!(status, HopStatus::at(TxStatus::Failed, 3, 7));
}

#[tokio::test]
async fn multisig_approval_is_pending_at_its_timepoint() {
    let chain = MockChain::new();
    let ms = multisig(&[address(1), address(2), address(3)], 3);
    let hash = remark("pay").hash();
    let events = records(vec![multisig_approval(address(3), timepoint(4, 0), ms, hash)]);

    let status = classify_multisig(&chain, &events, ms, hash, block_hash(6)).await.unwrap();

    assert_eq!(status, HopStatus::at(TxStatus::Pending, 4, 0));
}

#[tokio::test]
async fn new_multisig_is_pending_without_coordinates() {
    let chain = MockChain::new();
    let ms = multisig(&[address(1), address(2)], 2);
    let hash = remark("pay").hash();
    let events = records(vec![new_multisig(address(1), ms, hash)]);

    let status = classify_multisig(&chain, &events, ms, hash, block_hash(6)).await.unwrap();

    assert_eq!(status, HopStatus::new(TxStatus::Pending));
    assert_eq!(status.height(), None);
    assert_eq!(chain.storage_queries(), 0);
}

#[tokio::test]
async fn events_of_other_multisigs_fall_back_to_storage() {
    // Arrange
    let chain = MockChain::new();
    let ms = multisig(&[address(1), address(2)], 2);
    let other = multisig(&[address(1), address(3)], 2);
    let hash = remark("pay").hash();
    let events = records(vec![
        multisig_executed(address(3), timepoint(2, 2), other, hash, ok()),
        new_multisig(address(1), ms, remark("other call").hash()),
    ]);
    chain.open_multisig(ms, hash, timepoint(2, 1));

    // Act
    let status = classify_multisig(&chain, &events, ms, hash, block_hash(8)).await.unwrap();

    // Assert
    assert_eq!(status, HopStatus::at(TxStatus::Pending, 2, 1));
    assert_eq!(chain.storage_queries(), 1);
}

#[tokio::test]
async fn multisig_without_events_or_storage_is_initialized() {
    let chain = MockChain::new();
    let ms = multisig(&[address(1), address(2)], 2);

    let status =
        classify_multisig(&chain, &[], ms, remark("pay").hash(), block_hash(8)).await.unwrap();

    assert_eq!(status, HopStatus::new(TxStatus::Initialized));
}

#[tokio::test]
async fn storage_failure_is_returned() {
    let chain = MockChain::new();
    chain.fail_storage_queries(true);
    let ms = multisig(&[address(1), address(2)], 2);

    let err = classify_multisig(&chain, &[], ms, remark("pay").hash(), block_hash(8))
        .await
        .unwrap_err();

    assert!(matches!(err, ChainError::Query(_)));
}
