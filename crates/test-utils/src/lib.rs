//! Test utilities for the multisig/proxy calldata tracker.
//!
//! This crate provides fixture builders for addresses, calls and events, and a [`MockChain`]
//! implementing the engine's [`ChainApi`](multiproxy_calldata_engine::ChainApi) and
//! [`BestTxSource`](multiproxy_calldata_engine::BestTxSource) in memory, for integration tests
//! across this workspace.

mod mock_chain;

pub use self::mock_chain::MockChain;

use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash,
    call::{Call, CallKind, ProxyType, Timepoint},
    event::{ChainEvent, DispatchError, DispatchResult},
};
use multiproxy_calldata_utils::{call_hash, multisig_address};

// ADDRESSES
// ================================================================================================

/// Returns the address made of 32 copies of `byte`.
pub fn address(byte: u8) -> Address {
    Address::new([byte; 32])
}

/// Returns a deterministic block hash for `height`.
pub fn block_hash(height: u32) -> BlockHash {
    let mut bytes = [0xbb; 32];
    bytes[..4].copy_from_slice(&height.to_be_bytes());
    BlockHash::new(bytes)
}

/// Derives the multisig account of `signatories` at `threshold`.
pub fn multisig(signatories: &[Address], threshold: u16) -> Address {
    multisig_address(signatories, threshold)
}

/// Returns a timepoint.
pub fn timepoint(height: u32, index: u32) -> Timepoint {
    Timepoint::builder().height(height).index(index).build()
}

// CALLS
// ================================================================================================

fn call(kind: CallKind, salt: &str) -> Call {
    let hash = call_hash(format!("{kind:?}/{salt}").as_bytes());
    Call::new(hash, kind)
}

/// Returns a `balances.transferKeepAlive` of `value` to `dest`.
pub fn transfer(dest: Address, value: u128) -> Call {
    let kind = CallKind::Other { section: "balances".into(), method: "transferKeepAlive".into() };
    call(kind, &format!("{dest}/{value}"))
}

/// Returns a `system.remark` carrying `text`.
pub fn remark(text: &str) -> Call {
    call(CallKind::Other { section: "system".into(), method: "remark".into() }, text)
}

/// Returns a `multisig.asMulti` dispatching `inner`.
pub fn as_multi(
    threshold: u16,
    other_signatories: &[Address],
    maybe_timepoint: Option<Timepoint>,
    inner: Call,
) -> Call {
    let kind = CallKind::AsMulti {
        threshold,
        other_signatories: other_signatories.to_vec(),
        maybe_timepoint,
        call: Box::new(inner),
    };
    call(kind, "")
}

/// Returns a `multisig.approveAsMulti` approving the call `call_hash`.
pub fn approve_as_multi(
    threshold: u16,
    other_signatories: &[Address],
    maybe_timepoint: Option<Timepoint>,
    call_hash: CallHash,
) -> Call {
    let kind = CallKind::ApproveAsMulti {
        threshold,
        other_signatories: other_signatories.to_vec(),
        maybe_timepoint,
        call_hash,
    };
    call(kind, "")
}

/// Returns a `multisig.asMultiThreshold1` dispatching `inner`.
pub fn as_multi_threshold_1(other_signatories: &[Address], inner: Call) -> Call {
    let kind = CallKind::AsMultiThreshold1 {
        other_signatories: other_signatories.to_vec(),
        call: Box::new(inner),
    };
    call(kind, "")
}

/// Returns a `multisig.cancelAsMulti` of the operation `call_hash` opened at `timepoint`.
pub fn cancel_as_multi(
    threshold: u16,
    other_signatories: &[Address],
    timepoint: Timepoint,
    call_hash: CallHash,
) -> Call {
    let kind = CallKind::CancelAsMulti {
        threshold,
        other_signatories: other_signatories.to_vec(),
        timepoint,
        call_hash,
    };
    call(kind, "")
}

/// Returns a `proxy.proxy` dispatching `inner` for `real`.
pub fn proxy(real: Address, inner: Call) -> Call {
    let kind =
        CallKind::Proxy { real, force_proxy_type: Some(ProxyType::Any), call: Box::new(inner) };
    call(kind, "")
}

/// Returns a `proxy.proxyAnnounced` dispatching `inner` for `real` as announced by `delegate`.
pub fn proxy_announced(delegate: Address, real: Address, inner: Call) -> Call {
    let kind = CallKind::ProxyAnnounced {
        delegate,
        real,
        force_proxy_type: None,
        call: Box::new(inner),
    };
    call(kind, "")
}

/// Returns a `proxy.announce` of the call `call_hash` for `real`.
pub fn announce(real: Address, call_hash: CallHash) -> Call {
    call(CallKind::Announce { real, call_hash }, "")
}

// EVENTS
// ================================================================================================

/// A successful dispatch result.
pub fn ok() -> DispatchResult {
    Ok(())
}

/// A failed dispatch result.
pub fn dispatch_error(description: &str) -> DispatchResult {
    Err(DispatchError::new(description))
}

/// `system.ExtrinsicSuccess`
pub fn extrinsic_success() -> ChainEvent {
    ChainEvent::ExtrinsicSuccess
}

/// `system.ExtrinsicFailed`
pub fn extrinsic_failed(description: &str) -> ChainEvent {
    ChainEvent::ExtrinsicFailed { error: DispatchError::new(description) }
}

/// `multisig.NewMultisig`
pub fn new_multisig(approving: Address, multisig: Address, call_hash: CallHash) -> ChainEvent {
    ChainEvent::NewMultisig { approving, multisig, call_hash }
}

/// `multisig.MultisigApproval`
pub fn multisig_approval(
    approving: Address,
    timepoint: Timepoint,
    multisig: Address,
    call_hash: CallHash,
) -> ChainEvent {
    ChainEvent::MultisigApproval { approving, timepoint, multisig, call_hash }
}

/// `multisig.MultisigExecuted`
pub fn multisig_executed(
    approving: Address,
    timepoint: Timepoint,
    multisig: Address,
    call_hash: CallHash,
    result: DispatchResult,
) -> ChainEvent {
    ChainEvent::MultisigExecuted { approving, timepoint, multisig, call_hash, result }
}

/// `multisig.MultisigCancelled`
pub fn multisig_cancelled(
    cancelling: Address,
    timepoint: Timepoint,
    multisig: Address,
    call_hash: CallHash,
) -> ChainEvent {
    ChainEvent::MultisigCancelled { cancelling, timepoint, multisig, call_hash }
}

/// `proxy.ProxyExecuted`
pub fn proxy_executed(result: DispatchResult) -> ChainEvent {
    ChainEvent::ProxyExecuted { result }
}
