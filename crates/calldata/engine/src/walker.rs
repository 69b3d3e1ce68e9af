//! Unwrapping of nested multisig and proxy calls into a chain of hops.

use bon::Builder;
use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash,
    call::{Call, CallKind},
    event::{ChainEvent, EventRecord},
    record::CallRecord,
    tx::TxStatus,
};
use multiproxy_calldata_utils::multisig_address;

use crate::{
    chain::{CallResolver, ChainApi, ChainError},
    classifier::{self, HopStatus, ProxyEventCursor, StatusCache},
};

/// The submitted extrinsic a chain walk starts from.
#[derive(Debug, Clone, Copy, Builder)]
pub struct ExtrinsicContext<'a> {
    /// The extrinsic signer, sender of hop 0.
    signer: Address,
    /// Hash of the including block, where multisig storage is read.
    block_hash: BlockHash,
    /// Height of the including block.
    height: u32,
    /// Index of the extrinsic within its block.
    index: u32,
    /// The events emitted while applying this extrinsic.
    events: &'a [EventRecord],
}

impl<'a> ExtrinsicContext<'a> {
    /// Returns the extrinsic signer.
    pub fn signer(&self) -> Address {
        self.signer
    }

    /// Returns the including block hash.
    pub fn block_hash(&self) -> BlockHash {
        self.block_hash
    }

    /// Returns the including block height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the extrinsic index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the events of this extrinsic.
    pub fn events(&self) -> &'a [EventRecord] {
        self.events
    }

    /// Returns `true` if the extrinsic itself dispatched successfully.
    pub fn succeeded(&self) -> bool {
        self.events.iter().any(|record| matches!(record.event(), ChainEvent::ExtrinsicSuccess))
    }
}

struct Hop {
    call: Option<Call>,
    hash: CallHash,
    sender: Address,
    status: HopStatus,
}

/// Walks `call` from the outermost hop inwards, classifying every hop.
///
/// Hop 0 is `call` itself, sent by the signer; its status only reflects whether the extrinsic
/// succeeded. Each `multisig.asMulti`, `multisig.approveAsMulti` or `proxy.proxy` hop yields the
/// next one, sent by the derived multisig account or by `real`. The walk ends at any other call,
/// or at an `approveAsMulti` target `resolver` does not know, which is recorded by hash only.
///
/// Every record is passed to `on_hop` and returned, outermost first. Multisig classifications are
/// memoised in `cache`; storage query failures are returned as is.
#[tracing::instrument(
    skip_all,
    fields(
        signer = %extrinsic.signer(),
        height = extrinsic.height(),
        index = extrinsic.index(),
        call = %call.hash(),
    ),
)]
pub async fn reduce_calldata<C, R, F>(
    chain: &C,
    extrinsic: &ExtrinsicContext<'_>,
    call: &Call,
    resolver: &R,
    cache: &mut StatusCache,
    mut on_hop: F,
) -> Result<Vec<CallRecord>, ChainError>
where
    C: ChainApi + ?Sized,
    R: CallResolver + ?Sized,
    F: FnMut(&CallRecord),
{
    let events = extrinsic.events();
    let mut cursor = ProxyEventCursor::new(events);

    let outer_status = if extrinsic.succeeded() { TxStatus::Success } else { TxStatus::Failed };
    let mut hop = Hop {
        call: Some(call.clone()),
        hash: call.hash(),
        sender: extrinsic.signer(),
        status: HopStatus::at(outer_status, extrinsic.height(), extrinsic.index()),
    };

    let mut records = Vec::new();

    for depth in 0.. {
        let next = match hop.call.as_ref().map(Call::kind) {
            Some(CallKind::AsMulti { threshold, other_signatories, call: inner, .. }) => {
                let multisig = derive_multisig(hop.sender, other_signatories, *threshold);
                let status = classifier::classify_multisig_cached(
                    chain,
                    cache,
                    events,
                    multisig,
                    inner.hash(),
                    extrinsic.block_hash(),
                )
                .await?;

                Some(Hop {
                    call: Some((**inner).clone()),
                    hash: inner.hash(),
                    sender: multisig,
                    status,
                })
            },
            Some(CallKind::ApproveAsMulti { threshold, other_signatories, call_hash, .. }) => {
                let multisig = derive_multisig(hop.sender, other_signatories, *threshold);
                let status = classifier::classify_multisig_cached(
                    chain,
                    cache,
                    events,
                    multisig,
                    *call_hash,
                    extrinsic.block_hash(),
                )
                .await?;

                let call = resolver.resolve(*call_hash).cloned();
                if call.is_none() {
                    tracing::debug!(%call_hash, "approved call data unknown");
                }

                Some(Hop { call, hash: *call_hash, sender: multisig, status })
            },
            Some(CallKind::Proxy { real, call: inner, .. }) => {
                let status =
                    classifier::classify_proxy(&mut cursor, extrinsic.height(), extrinsic.index());

                Some(Hop {
                    call: Some((**inner).clone()),
                    hash: inner.hash(),
                    sender: *real,
                    status,
                })
            },
            _ => None,
        };

        let record = CallRecord::builder()
            .maybe_call(hop.call.take())
            .hash(hop.hash)
            .sender(hop.sender)
            .is_start(depth == 0)
            .is_end(next.is_none())
            .status(hop.status.status())
            .maybe_height(hop.status.height())
            .maybe_extrinsic_index(hop.status.extrinsic_index())
            .depth(depth)
            .build();

        tracing::trace!(depth, sender = %record.sender(), status = %record.status(), "hop");
        on_hop(&record);
        records.push(record);

        match next {
            Some(next) => hop = next,
            None => break,
        }
    }

    Ok(records)
}

pub(crate) fn derive_multisig(
    sender: Address,
    other_signatories: &[Address],
    threshold: u16,
) -> Address {
    let signatories: Vec<Address> =
        other_signatories.iter().copied().chain(core::iter::once(sender)).collect();
    multisig_address(&signatories, threshold)
}
