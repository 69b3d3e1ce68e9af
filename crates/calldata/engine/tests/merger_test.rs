//! integration tests for the transaction merger

use multiproxy_calldata_domain::{
    CallHash,
    record::CallRecord,
    tx::{Transaction, TransactionKind, TxIndex, TxStatus},
};
use multiproxy_calldata_engine::{
    CalldataEngineErrorKind, MAX_DECODE_ATTEMPTS, MergeSummary, TransactionMerger, Upserted,
};
use multiproxy_test_utils::{
    MockChain, address, approve_as_multi, as_multi, block_hash, cancel_as_multi, extrinsic_success,
    multisig, multisig_cancelled, multisig_executed, new_multisig, ok, proxy, proxy_executed,
    remark, timepoint, transfer,
};

async fn merge_reported(merger: &mut TransactionMerger, chain: &MockChain) -> MergeSummary {
    merger.merge_calldata(chain, &chain.reported()).await.unwrap()
}

fn only(merger: &TransactionMerger, hash: CallHash) -> &Transaction {
    let mut matching = merger.store().by_hash(hash);
    let tx = matching.next().unwrap();
    assert!(matching.next().is_none(), "more than one transaction for {hash}");
    tx
}

#[tokio::test]
async fn merging_the_same_extrinsic_twice_changes_nothing() {
    // Arrange
    let chain = MockChain::new();
    let (x, y) = (address(1), address(2));
    let ms = multisig(&[x, y], 2);
    let business = transfer(address(7), 100);
    let top = as_multi(2, &[y], None, business.clone());
    chain.submit(x, 5, 0, &top, vec![new_multisig(x, ms, business.hash()), extrinsic_success()]);

    let mut merger = TransactionMerger::new();

    // Act
    let first = merge_reported(&mut merger, &chain).await;
    let second = merge_reported(&mut merger, &chain).await;

    // Assert
    assert_eq!(first, MergeSummary { processed: 1, inserted: 2, ..MergeSummary::default() });
    assert_eq!(second, MergeSummary { skipped: 1, ..MergeSummary::default() });
    assert_eq!(merger.store().len(), 2);
    assert_eq!(only(&merger, business.hash()).status(), TxStatus::Pending);
    assert!(merger.is_seen(block_hash(5), 0));
}

#[tokio::test]
async fn duplicate_records_in_one_batch_are_merged_once() {
    let chain = MockChain::new();
    let best = chain.submit(address(1), 3, 0, &remark("dup"), vec![extrinsic_success()]);
    let mut merger = TransactionMerger::new();

    let summary = merger.merge_calldata(&chain, &[best.clone(), best]).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(merger.store().len(), 1);
}

#[tokio::test]
async fn later_execution_refines_the_open_transaction() {
    // Arrange
    let chain = MockChain::new();
    let (x, y) = (address(1), address(2));
    let ms = multisig(&[x, y], 2);
    let business = transfer(address(7), 100);

    let opening = as_multi(2, &[y], None, business.clone());
    let opened = new_multisig(x, ms, business.hash());
    chain.submit(x, 5, 0, &opening, vec![opened, extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;

    let executing = as_multi(2, &[x], Some(timepoint(5, 0)), business.clone());
    let executed = multisig_executed(y, timepoint(5, 0), ms, business.hash(), ok());
    chain.submit(y, 6, 1, &executing, vec![executed, extrinsic_success()]);

    // Act
    let summary = merge_reported(&mut merger, &chain).await;

    // Assert
    assert_eq!((summary.skipped, summary.processed), (1, 1));
    assert_eq!((summary.inserted, summary.updated), (1, 1));
    assert_eq!(merger.store().len(), 3);

    let root = only(&merger, business.hash());
    assert!(root.is_root());
    assert_eq!(root.status(), TxStatus::Success);
    assert_eq!((root.height(), root.extrinsic_index()), (Some(5), Some(0)));
    assert_eq!(root.kind(), TransactionKind::Multisig);

    let opener = only(&merger, opening.hash());
    let executor = only(&merger, executing.hash());
    assert_eq!(root.children(), &[opener.index(), executor.index()]);
    assert_eq!(opener.parent(), root.index());
    assert_eq!(executor.parent(), root.index());

    // every hop of the execution shares the origin of the tree
    assert_eq!(opener.init_transaction(), opener.index());
    assert_eq!(root.init_transaction(), opener.index());
    assert_eq!(executor.init_transaction(), opener.index());
}

#[tokio::test]
async fn earlier_hop_reported_late_becomes_the_origin() {
    // Arrange: ms1 is a member of ms2, and x approves through ms1 at block 9
    let chain = MockChain::new();
    let (x, y, z) = (address(1), address(2), address(3));
    let ms1 = multisig(&[x, y], 2);
    let ms2 = multisig(&[ms1, z], 2);

    let business = transfer(address(7), 1);
    let inner = as_multi(2, &[z], None, business.clone());
    let outer = as_multi(2, &[y], None, inner.clone());
    chain.submit(x, 9, 0, &outer, vec![new_multisig(x, ms1, inner.hash()), extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;
    let approver = only(&merger, outer.hash()).index();
    assert_eq!(only(&merger, business.hash()).init_transaction(), approver);

    // z opened the ms2 operation at block 7, but it is only reported now
    let opening = as_multi(2, &[ms1], None, business.clone());
    let opened = new_multisig(z, ms2, business.hash());
    chain.submit(z, 7, 0, &opening, vec![opened, extrinsic_success()]);

    // Act
    merge_reported(&mut merger, &chain).await;

    // Assert
    let opener = only(&merger, opening.hash());
    let root = only(&merger, business.hash());
    assert_eq!(root.status(), TxStatus::Pending);
    assert_eq!(opener.init_transaction(), opener.index());
    assert_eq!(root.init_transaction(), opener.index());
    assert_eq!(only(&merger, inner.hash()).init_transaction(), approver);
}

#[tokio::test]
async fn extrinsics_are_merged_in_chain_order() {
    let chain = MockChain::new();
    let (x, y) = (address(1), address(2));
    let ms = multisig(&[x, y], 2);
    let business = remark("ordered");

    let opening = chain.submit(
        x,
        5,
        0,
        &as_multi(2, &[y], None, business.clone()),
        vec![new_multisig(x, ms, business.hash()), extrinsic_success()],
    );
    let executing = chain.submit(
        y,
        6,
        0,
        &as_multi(2, &[x], Some(timepoint(5, 0)), business.clone()),
        vec![multisig_executed(y, timepoint(5, 0), ms, business.hash(), ok()), extrinsic_success()],
    );

    let mut merger = TransactionMerger::new();
    merger.merge_calldata(&chain, &[executing, opening]).await.unwrap();

    assert_eq!(only(&merger, business.hash()).status(), TxStatus::Success);
}

#[tokio::test]
async fn proxy_parent_is_delegated_to_the_proxy_sender() {
    let chain = MockChain::new();
    let (delegate, real) = (address(1), address(9));
    let business = transfer(address(3), 5);
    chain.submit(
        delegate,
        2,
        0,
        &proxy(real, business.clone()),
        vec![proxy_executed(ok()), extrinsic_success()],
    );

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;

    let root = only(&merger, business.hash());
    assert_eq!(root.sender(), real);
    assert_eq!(root.status(), TxStatus::Success);
    assert_eq!(root.kind(), TransactionKind::Proxy);
    assert_eq!(root.delegate(), Some(delegate));
}

#[tokio::test]
async fn cancellation_marks_the_canceller_and_initialized_ancestors() {
    // Arrange: x approves for ms1, which is itself a member of ms2
    let chain = MockChain::new();
    let (x, y, z) = (address(1), address(2), address(3));
    let ms1 = multisig(&[x, y], 2);

    let business = transfer(address(7), 1);
    let inner = as_multi(2, &[z], None, business.clone());
    let outer = as_multi(2, &[y], None, inner.clone());
    chain.submit(x, 5, 0, &outer, vec![new_multisig(x, ms1, inner.hash()), extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;
    assert_eq!(only(&merger, business.hash()).status(), TxStatus::Initialized);
    assert_eq!(only(&merger, inner.hash()).status(), TxStatus::Pending);

    let cancel = cancel_as_multi(2, &[y], timepoint(5, 0), inner.hash());
    let cancelled = multisig_cancelled(x, timepoint(5, 0), ms1, inner.hash());
    chain.submit(x, 7, 0, &cancel, vec![cancelled, extrinsic_success()]);

    // Act
    let summary = merge_reported(&mut merger, &chain).await;

    // Assert
    assert_eq!(summary.cancelled, 3);
    assert_eq!(merger.store().len(), 3);
    for hash in [outer.hash(), inner.hash(), business.hash()] {
        assert_eq!(only(&merger, hash).status(), TxStatus::Cancelled, "{hash}");
    }
}

#[tokio::test]
async fn cancellation_sent_through_a_proxy_is_applied() {
    // Arrange: x opens a multisig operation wrapping a proxy call
    let chain = MockChain::new();
    let (x, y, z) = (address(1), address(2), address(3));
    let (real, delegate) = (address(8), address(9));
    let ms = multisig(&[x, y, z], 2);

    let business = transfer(address(7), 1);
    let proxied = proxy(real, business.clone());
    let opening = as_multi(2, &[y, z], None, proxied.clone());
    chain.submit(x, 5, 0, &opening, vec![new_multisig(x, ms, proxied.hash()), extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;
    assert_eq!(only(&merger, proxied.hash()).status(), TxStatus::Pending);

    // a delegate of x cancels it
    let cancel = proxy(x, cancel_as_multi(2, &[y, z], timepoint(5, 0), proxied.hash()));
    let cancelled = multisig_cancelled(x, timepoint(5, 0), ms, proxied.hash());
    chain.submit(
        delegate,
        7,
        0,
        &cancel,
        vec![proxy_executed(ok()), cancelled, extrinsic_success()],
    );

    // Act
    let summary = merge_reported(&mut merger, &chain).await;

    // Assert
    assert_eq!(summary.cancelled, 3);
    assert_eq!(merger.store().len(), 3);
    for hash in [opening.hash(), proxied.hash(), business.hash()] {
        assert_eq!(only(&merger, hash).status(), TxStatus::Cancelled, "{hash}");
    }
}

#[tokio::test]
async fn cancel_as_multi_without_cancelled_event_is_ignored() {
    let chain = MockChain::new();
    let (x, y) = (address(1), address(2));
    let ms = multisig(&[x, y], 2);
    let business = remark("keep");
    chain.submit(
        x,
        5,
        0,
        &as_multi(2, &[y], None, business.clone()),
        vec![new_multisig(x, ms, business.hash()), extrinsic_success()],
    );
    chain.submit(
        x,
        6,
        0,
        &cancel_as_multi(2, &[y], timepoint(5, 0), business.hash()),
        vec![extrinsic_success()],
    );

    let mut merger = TransactionMerger::new();
    let summary = merge_reported(&mut merger, &chain).await;

    assert_eq!((summary.processed, summary.cancelled), (2, 0));
    assert_eq!(only(&merger, business.hash()).status(), TxStatus::Pending);
}

#[test]
fn cancelling_an_unknown_operation_is_a_no_op() {
    let mut merger = TransactionMerger::new();

    let cancelled =
        merger.cancel_transaction(remark("nothing").hash(), address(1), address(2)).unwrap();

    assert_eq!(cancelled, 0);
    assert!(merger.store().is_empty());
}

#[tokio::test]
async fn undecodable_extrinsics_are_given_up_after_repeated_passes() {
    let chain = MockChain::new();
    chain.submit_undecodable(address(1), 3, 0);
    chain.submit(address(1), 3, 1, &remark("fine"), vec![extrinsic_success()]);
    let mut merger = TransactionMerger::new();

    let first = merge_reported(&mut merger, &chain).await;
    assert_eq!((first.undecodable, first.processed), (1, 1));

    for _ in 1..MAX_DECODE_ATTEMPTS {
        assert!(!merger.is_seen(block_hash(3), 0));
        let retry = merge_reported(&mut merger, &chain).await;
        assert_eq!((retry.undecodable, retry.skipped), (1, 1));
    }
    assert!(merger.is_seen(block_hash(3), 0));

    let last = merge_reported(&mut merger, &chain).await;
    assert_eq!(last, MergeSummary { skipped: 2, ..MergeSummary::default() });
    assert_eq!(merger.store().len(), 1);
}

#[tokio::test]
async fn extrinsics_decoded_in_a_later_pass_are_merged() {
    let chain = MockChain::new();
    let call = remark("after upgrade");
    chain.submit_unknown(address(1), 3, 0, &call, vec![extrinsic_success()]);
    let mut merger = TransactionMerger::new();

    let first = merge_reported(&mut merger, &chain).await;
    assert_eq!((first.undecodable, first.processed), (1, 0));
    assert!(merger.store().is_empty());

    chain.learn_call(&call);
    let second = merge_reported(&mut merger, &chain).await;

    assert_eq!((second.undecodable, second.processed), (0, 1));
    assert_eq!(only(&merger, call.hash()).status(), TxStatus::Success);
}

#[tokio::test]
async fn failed_event_query_is_retried_on_the_next_pass() {
    // Arrange
    let chain = MockChain::new();
    let call = remark("retry");
    chain.submit(address(1), 4, 0, &call, vec![extrinsic_success()]);
    chain.fail_event_queries(true);

    let mut merger = TransactionMerger::new();

    // Act
    let err = merger.merge_calldata(&chain, &chain.reported()).await.unwrap_err();

    // Assert
    assert!(matches!(err.kind(), CalldataEngineErrorKind::Chain(_)));
    assert!(merger.store().is_empty());
    assert!(!merger.is_seen(block_hash(4), 0));

    chain.fail_event_queries(false);
    let summary = merge_reported(&mut merger, &chain).await;
    assert_eq!(summary.processed, 1);
    assert_eq!(only(&merger, call.hash()).status(), TxStatus::Success);
}

#[tokio::test]
async fn block_events_are_fetched_once_per_block() {
    let chain = MockChain::new();
    chain.submit(address(1), 4, 0, &remark("a"), vec![extrinsic_success()]);
    chain.submit(address(2), 4, 1, &remark("b"), vec![extrinsic_success()]);
    chain.submit(address(3), 5, 0, &remark("c"), vec![extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;

    assert_eq!(chain.event_queries(), 2);
}

#[tokio::test]
async fn learned_call_data_fills_earlier_approvals() {
    // Arrange
    let chain = MockChain::new();
    let (x, y) = (address(1), address(2));
    let ms = multisig(&[x, y], 2);
    let business = transfer(address(4), 40);

    let approval = approve_as_multi(2, &[y], None, business.hash());
    let opened = new_multisig(x, ms, business.hash());
    chain.submit(x, 5, 0, &approval, vec![opened, extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    merge_reported(&mut merger, &chain).await;
    assert_eq!(only(&merger, business.hash()).call(), None);

    let executing = as_multi(2, &[x], Some(timepoint(5, 0)), business.clone());
    let executed = multisig_executed(y, timepoint(5, 0), ms, business.hash(), ok());
    chain.submit(y, 6, 0, &executing, vec![executed, extrinsic_success()]);

    // Act
    merge_reported(&mut merger, &chain).await;

    // Assert
    let root = only(&merger, business.hash());
    assert_eq!(root.call(), Some(&business));
    assert_eq!(root.status(), TxStatus::Success);
    assert!(merger.known_calls().contains_key(&business.hash()));
}

#[tokio::test]
async fn registered_calls_resolve_approvals() {
    let chain = MockChain::new();
    let (x, y, real) = (address(1), address(2), address(9));
    let ms = multisig(&[x, y], 2);
    let business = remark("through proxy");
    let proxied = proxy(real, business.clone());

    let approval = approve_as_multi(2, &[y], None, proxied.hash());
    let opened = new_multisig(x, ms, proxied.hash());
    chain.submit(x, 5, 0, &approval, vec![opened, extrinsic_success()]);

    let mut merger = TransactionMerger::new();
    assert_eq!(merger.register_call(&proxied), 0);
    merge_reported(&mut merger, &chain).await;

    assert_eq!(merger.store().len(), 3);
    let root = only(&merger, business.hash());
    assert_eq!(root.sender(), real);
    assert_eq!(root.status(), TxStatus::Initialized);
}

#[test]
fn insert_or_update_matches_open_transactions_only() {
    let mut merger = TransactionMerger::new();
    let call = remark("upsert");
    let record = |status: TxStatus, height: Option<u32>| {
        CallRecord::builder()
            .call(call.clone())
            .hash(call.hash())
            .sender(address(1))
            .is_start(false)
            .is_end(true)
            .status(status)
            .maybe_height(height)
            .depth(1)
            .build()
    };

    let first = merger.insert_or_update(&record(TxStatus::Pending, None)).unwrap();
    assert_eq!(first, Upserted::Inserted(TxIndex::new(0)));

    let same = merger.insert_or_update(&record(TxStatus::Initialized, None)).unwrap();
    assert_eq!(same, Upserted::Unchanged(TxIndex::new(0)));

    let done = merger.insert_or_update(&record(TxStatus::Success, Some(8))).unwrap();
    assert_eq!(done, Upserted::Updated(TxIndex::new(0)));

    // closed now, so the next observation starts a new transaction
    let again = merger.insert_or_update(&record(TxStatus::Pending, None)).unwrap();
    assert_eq!(again, Upserted::Inserted(TxIndex::new(1)));
    assert_eq!(merger.store().by_hash(call.hash()).count(), 2);
}
