use alloc::{boxed::Box, string::ToString, vec, vec::Vec};

use chrono::DateTime;

use crate::{
    Address, H256, Timestamps,
    call::{Call, CallKind, ProxyType},
    path::{FilterPath, FilterPathStep},
    tx::{Transaction, TransactionId, TransactionKind, TxIndex, TxStatus},
};

fn address(byte: u8) -> Address {
    Address::new([byte; 32])
}

fn transfer(byte: u8) -> Call {
    let kind = CallKind::Other { section: "balances".into(), method: "transferKeepAlive".into() };
    Call::new(H256::new([byte; 32]), kind)
}

fn timestamps() -> Timestamps {
    let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    Timestamps::builder().created_at(t).updated_at(t).build()
}

fn transaction(index: usize, status: TxStatus) -> Transaction {
    Transaction::builder()
        .id(TransactionId::from(uuid::Uuid::nil()))
        .index(TxIndex::new(index))
        .hash(H256::new([7; 32]))
        .sender(address(1))
        .status(status)
        .timestamps(timestamps())
        .build()
}

#[test]
fn address_round_trips_through_hex_with_and_without_prefix() {
    let addr = address(0xab);
    let hex = addr.to_hex();

    assert!(hex.starts_with("0x"));
    assert_eq!(hex.len(), 66);
    assert_eq!(hex.parse::<Address>().unwrap(), addr);
    assert_eq!(hex.trim_start_matches("0x").parse::<Address>().unwrap(), addr);
}

#[test]
fn address_rejects_wrong_length() {
    assert!("0xabcd".parse::<Address>().is_err());
    assert!("zz".repeat(32).parse::<Address>().is_err());
}

#[test]
fn status_below_success_is_open() {
    assert!(TxStatus::Initialized.is_open());
    assert!(TxStatus::Pending.is_open());
    assert!(!TxStatus::Success.is_open());
    assert!(!TxStatus::Failed.is_open());
    assert!(!TxStatus::MemberChanged.is_open());
    assert!(!TxStatus::Cancelled.is_open());
}

#[test]
fn status_uses_snake_case_names() {
    assert_eq!(TxStatus::MemberChanged.to_string(), "member_changed");
    assert_eq!("cancelled".parse::<TxStatus>().unwrap(), TxStatus::Cancelled);
}

#[test]
fn call_section_and_method_follow_the_variant() {
    let inner = transfer(2);
    let as_multi = Call::new(
        H256::new([3; 32]),
        CallKind::AsMulti {
            threshold: 2,
            other_signatories: vec![address(2)],
            maybe_timepoint: None,
            call: Box::new(inner.clone()),
        },
    );
    let proxy = Call::new(
        H256::new([4; 32]),
        CallKind::Proxy { real: address(5), force_proxy_type: None, call: Box::new(inner.clone()) },
    );

    assert!(as_multi.is("multisig", "asMulti"));
    assert!(proxy.is("proxy", "proxy"));
    assert!(inner.is("balances", "transferKeepAlive"));
    assert_eq!(as_multi.inner_call(), Some(&inner));
    assert_eq!(inner.inner_call(), None);
}

#[test]
fn wrapper_calls_map_to_transaction_kinds() {
    let announce = Call::new(
        H256::new([1; 32]),
        CallKind::Announce { real: address(1), call_hash: H256::new([2; 32]) },
    );
    let approve = Call::new(
        H256::new([1; 32]),
        CallKind::ApproveAsMulti {
            threshold: 2,
            other_signatories: Vec::new(),
            maybe_timepoint: None,
            call_hash: H256::new([2; 32]),
        },
    );

    assert_eq!(TransactionKind::of_wrapper(&announce), Some(TransactionKind::Announce));
    assert_eq!(TransactionKind::of_wrapper(&approve), Some(TransactionKind::Multisig));
    assert_eq!(TransactionKind::of_wrapper(&transfer(1)), None);
}

#[test]
fn proxy_type_keeps_unknown_names() {
    assert_eq!("Staking".parse::<ProxyType>().unwrap(), ProxyType::Staking);

    let custom: ProxyType = "AssetManager".parse().unwrap();
    assert_eq!(custom, ProxyType::Other("AssetManager".into()));
    assert_eq!(custom.to_string(), "AssetManager");
}

#[test]
fn new_transaction_is_its_own_root() {
    let tx = transaction(3, TxStatus::Pending);

    assert!(tx.is_root());
    assert_eq!(tx.parent(), TxIndex::new(3));
    assert_eq!(tx.init_transaction(), TxIndex::new(3));
    assert_eq!(tx.kind(), TransactionKind::Unknown);
}

#[test]
fn refine_never_moves_status_backwards() {
    let mut tx = transaction(0, TxStatus::Pending);

    assert!(!tx.refine(TxStatus::Initialized, None, None));
    assert_eq!(tx.status(), TxStatus::Pending);

    assert!(tx.refine(TxStatus::Success, Some(10), Some(2)));
    assert_eq!(tx.status(), TxStatus::Success);
    assert_eq!(tx.height(), Some(10));
    assert_eq!(tx.extrinsic_index(), Some(2));

    assert!(!tx.refine(TxStatus::Pending, None, None));
    assert_eq!(tx.height(), Some(10));
}

#[test]
fn fill_call_only_accepts_matching_hash() {
    let mut tx = transaction(0, TxStatus::Pending);

    assert!(!tx.fill_call(&transfer(9)));
    assert!(tx.call().is_none());

    assert!(tx.fill_call(&transfer(7)));
    assert!(!tx.fill_call(&transfer(7)));
    assert_eq!(tx.call().map(Call::hash), Some(H256::new([7; 32])));
}

#[test]
fn push_child_ignores_duplicates() {
    let mut tx = transaction(0, TxStatus::Pending);

    assert!(tx.push_child(TxIndex::new(1)));
    assert!(!tx.push_child(TxIndex::new(1)));
    assert_eq!(tx.children(), &[TxIndex::new(1)]);
}

#[test]
fn filter_path_ids_are_built_from_step_fields() {
    let path = FilterPath::from(vec![
        FilterPathStep::Origin { address: address(1) },
        FilterPathStep::Proxy {
            address: address(2),
            real: address(1),
            proxy_type: ProxyType::Any,
            delay: 0,
        },
    ]);

    let origin_id = path.steps()[0].id();
    let proxy_id = path.steps()[1].id();

    assert_eq!(origin_id, alloc::format!("origin-{}", address(1)));
    assert_eq!(proxy_id, alloc::format!("proxy-{}-{}-Any-0", address(2), address(1)));
    assert_eq!(path.id(), alloc::format!("{origin_id}/{proxy_id}"));
    assert_eq!(path.signer(), Some(address(2)));
}
