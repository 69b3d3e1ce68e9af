//! Status classification of wrapped calls from extrinsic events and multisig storage.

use std::collections::HashMap;

use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash,
    call::Timepoint,
    event::{ChainEvent, DispatchResult, EventRecord},
    tx::TxStatus,
};

use crate::chain::{ChainApi, ChainError};

/// Status and block coordinates derived for one hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopStatus {
    status: TxStatus,
    height: Option<u32>,
    extrinsic_index: Option<u32>,
}

impl HopStatus {
    /// Creates a hop status without block coordinates.
    pub fn new(status: TxStatus) -> Self {
        Self { status, height: None, extrinsic_index: None }
    }

    /// Creates a hop status confirmed at `(height, extrinsic_index)`.
    pub fn at(status: TxStatus, height: u32, extrinsic_index: u32) -> Self {
        Self { status, height: Some(height), extrinsic_index: Some(extrinsic_index) }
    }

    fn at_timepoint(status: TxStatus, timepoint: Timepoint) -> Self {
        Self::at(status, timepoint.height(), timepoint.index())
    }

    fn of_result(result: &DispatchResult) -> TxStatus {
        if result.is_ok() { TxStatus::Success } else { TxStatus::Failed }
    }

    /// Returns the status.
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Returns the block height, if known.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Returns the extrinsic index, if known.
    pub fn extrinsic_index(&self) -> Option<u32> {
        self.extrinsic_index
    }
}

/// Multisig classifications of one chain walk, keyed by `(multisig, call hash)`.
#[derive(Debug, Default)]
pub struct StatusCache(HashMap<(Address, CallHash), HopStatus>);

impl StatusCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached classification.
    pub fn get(&self, multisig: Address, call_hash: CallHash) -> Option<HopStatus> {
        self.0.get(&(multisig, call_hash)).copied()
    }

    /// Returns the number of cached classifications.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was classified yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, multisig: Address, call_hash: CallHash, status: HopStatus) {
        self.0.insert((multisig, call_hash), status);
    }
}

/// Hands out the `ProxyExecuted` events of one extrinsic, last first.
///
/// Nested `proxy.proxy` calls finish innermost first, so the outermost proxy hop, which the
/// walker classifies first, owns the last `ProxyExecuted` event. This only holds for a straight
/// chain of proxies: when one extrinsic dispatches several independent proxy calls (e.g. through
/// `utility.batch`) an event may be attributed to the wrong hop.
#[derive(Debug, Clone)]
pub struct ProxyEventCursor<'a> {
    events: &'a [EventRecord],
    end: usize,
}

impl<'a> ProxyEventCursor<'a> {
    /// Creates a cursor over the events of one extrinsic.
    pub fn new(events: &'a [EventRecord]) -> Self {
        Self { events, end: events.len() }
    }

    /// Takes the last `ProxyExecuted` result not handed out yet.
    pub fn take_last(&mut self) -> Option<&'a DispatchResult> {
        let events = self.events;
        let position = events[..self.end]
            .iter()
            .rposition(|record| matches!(record.event(), ChainEvent::ProxyExecuted { .. }))?;
        self.end = position;

        match events[position].event() {
            ChainEvent::ProxyExecuted { result } => Some(result),
            _ => None,
        }
    }

    /// Returns how many `ProxyExecuted` events are left.
    pub fn remaining(&self) -> usize {
        self.events[..self.end]
            .iter()
            .filter(|record| matches!(record.event(), ChainEvent::ProxyExecuted { .. }))
            .count()
    }
}

/// Classifies the call `call_hash` wrapped by `multisig.asMulti`/`approveAsMulti` of `multisig`.
///
/// In priority order: `MultisigExecuted` gives `Success`/`Failed` at the operation's timepoint,
/// `MultisigApproval` gives `Pending` at its timepoint, `NewMultisig` gives `Pending` without
/// coordinates. Without a matching event the multisig storage at `at` decides between `Pending`
/// at the stored `when` and `Initialized`.
pub async fn classify_multisig<C>(
    chain: &C,
    events: &[EventRecord],
    multisig: Address,
    call_hash: CallHash,
    at: BlockHash,
) -> Result<HopStatus, ChainError>
where
    C: ChainApi + ?Sized,
{
    if let Some(status) = classify_multisig_events(events, multisig, call_hash) {
        return Ok(status);
    }

    let status = match chain.multisig_timepoint(multisig, call_hash, at).await? {
        Some(when) => HopStatus::at_timepoint(TxStatus::Pending, when),
        None => HopStatus::new(TxStatus::Initialized),
    };

    Ok(status)
}

/// Like [`classify_multisig`], reusing and filling `cache`.
pub(crate) async fn classify_multisig_cached<C>(
    chain: &C,
    cache: &mut StatusCache,
    events: &[EventRecord],
    multisig: Address,
    call_hash: CallHash,
    at: BlockHash,
) -> Result<HopStatus, ChainError>
where
    C: ChainApi + ?Sized,
{
    if let Some(status) = cache.get(multisig, call_hash) {
        return Ok(status);
    }

    let status = classify_multisig(chain, events, multisig, call_hash, at).await?;
    cache.insert(multisig, call_hash, status);
    Ok(status)
}

fn classify_multisig_events(
    events: &[EventRecord],
    multisig: Address,
    call_hash: CallHash,
) -> Option<HopStatus> {
    let matching = || {
        events.iter().map(EventRecord::event).filter(|event| match event {
            ChainEvent::NewMultisig { multisig: m, call_hash: h, .. }
            | ChainEvent::MultisigApproval { multisig: m, call_hash: h, .. }
            | ChainEvent::MultisigExecuted { multisig: m, call_hash: h, .. } => {
                *m == multisig && *h == call_hash
            },
            _ => false,
        })
    };

    let executed = matching().find_map(|event| match event {
        ChainEvent::MultisigExecuted { timepoint, result, .. } => {
            Some(HopStatus::at_timepoint(HopStatus::of_result(result), *timepoint))
        },
        _ => None,
    });
    let approval = || {
        matching().find_map(|event| match event {
            ChainEvent::MultisigApproval { timepoint, .. } => {
                Some(HopStatus::at_timepoint(TxStatus::Pending, *timepoint))
            },
            _ => None,
        })
    };
    let opened = || {
        matching()
            .any(|event| matches!(event, ChainEvent::NewMultisig { .. }))
            .then(|| HopStatus::new(TxStatus::Pending))
    };

    executed.or_else(approval).or_else(opened)
}

/// Classifies the call wrapped by a `proxy.proxy` hop.
///
/// Takes the last remaining `ProxyExecuted` event of `cursor`; its result decides between
/// `Success` and `Failed` at the outer extrinsic's coordinates. With no event left the hop is
/// `Initialized`.
pub fn classify_proxy(cursor: &mut ProxyEventCursor<'_>, height: u32, index: u32) -> HopStatus {
    match cursor.take_last() {
        Some(result) => HopStatus::at(HopStatus::of_result(result), height, index),
        None => HopStatus::new(TxStatus::Initialized),
    }
}
