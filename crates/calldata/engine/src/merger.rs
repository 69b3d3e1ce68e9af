//! Deduplication of chain walks into a tree of logical transactions.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use itertools::Itertools;
use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash,
    best_tx::BestTx,
    call::{Call, CallKind},
    event::{ChainEvent, EventRecord},
    record::CallRecord,
    tx::{TxIndex, TxStatus},
};
use multiproxy_calldata_store::{NewTransaction, TransactionStore, TransactionStoreError};

use crate::{
    chain::ChainApi,
    classifier::StatusCache,
    error::Result,
    walker::{self, ExtrinsicContext},
};

/// Counts of what one [`TransactionMerger::merge_calldata`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Extrinsics walked or routed to cancellation.
    pub processed: usize,
    /// Extrinsics skipped because an earlier pass already merged them.
    pub skipped: usize,
    /// Extrinsics whose call bytes could not be decoded this pass.
    pub undecodable: usize,
    /// Transactions created.
    pub inserted: usize,
    /// Existing transactions whose status or coordinates changed.
    pub updated: usize,
    /// Transactions moved to [`TxStatus::Cancelled`].
    pub cancelled: usize,
}

/// Passes an undecodable extrinsic is retried in before it is skipped for good.
pub const MAX_DECODE_ATTEMPTS: u32 = 3;

/// Outcome of [`TransactionMerger::insert_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    /// A new transaction was created.
    Inserted(TxIndex),
    /// An open transaction was refined.
    Updated(TxIndex),
    /// An open transaction matched but nothing new was learned.
    Unchanged(TxIndex),
}

impl Upserted {
    /// Returns the index of the inserted or matched transaction.
    pub fn index(self) -> TxIndex {
        match self {
            Upserted::Inserted(index) | Upserted::Updated(index) | Upserted::Unchanged(index) => {
                index
            },
        }
    }
}

/// Keeps the logical transactions of a polling session current.
///
/// Each pass over the best-known extrinsics walks every new extrinsic and folds its hops into the
/// [`TransactionStore`]: a hop matches the open transaction with its call hash or creates one,
/// and each hop is linked as a child of the next, inner, hop.
#[derive(Debug, Default)]
pub struct TransactionMerger {
    store: TransactionStore,
    known_calls: HashMap<CallHash, Call>,
    seen: HashSet<(BlockHash, u32)>,
    decode_failures: HashMap<(BlockHash, u32), u32>,
}

impl TransactionMerger {
    /// Creates a merger with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a merger continuing from an existing store.
    pub fn with_store(store: TransactionStore) -> Self {
        Self { store, ..Self::default() }
    }

    /// Returns the transaction store.
    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    /// Consumes the merger, returning its store.
    pub fn into_store(self) -> TransactionStore {
        self.store
    }

    /// Returns the call data learned so far, by hash.
    pub fn known_calls(&self) -> &HashMap<CallHash, Call> {
        &self.known_calls
    }

    /// Returns `true` if the extrinsic at `(block_hash, index)` was already merged.
    pub fn is_seen(&self, block_hash: BlockHash, index: u32) -> bool {
        self.seen.contains(&(block_hash, index))
    }

    /// Remembers `call` and every call nested in it.
    ///
    /// Later `approveAsMulti` walks resolve their target through these, and stored transactions
    /// that lack call data get it filled in. Returns how many stored transactions were filled.
    pub fn register_call(&mut self, call: &Call) -> usize {
        let mut filled = 0;
        let mut next = Some(call);

        while let Some(call) = next {
            self.known_calls.entry(call.hash()).or_insert_with(|| call.clone());
            filled += self.store.fill_call_by_hash(call);
            next = call.inner_call();
        }

        filled
    }

    /// Merges a batch of best-known extrinsics.
    ///
    /// Extrinsics are handled in `(block_number, extrinsic_index)` order and each is merged at
    /// most once across passes. A walk ending in `cancelAsMulti`, whether sent directly or through
    /// proxies and multisigs, is routed to [`Self::cancel_transaction`] instead of being stored.
    /// An undecodable extrinsic is retried in later passes, since the decoder may lag behind a
    /// runtime upgrade, and skipped for good after [`MAX_DECODE_ATTEMPTS`] passes. A failed event
    /// or storage query aborts the pass; hops of the failing extrinsic are not applied and it is
    /// retried on the next pass.
    #[tracing::instrument(skip_all, fields(count = best_txs.len()))]
    pub async fn merge_calldata<C>(
        &mut self,
        chain: &C,
        best_txs: &[BestTx],
    ) -> Result<MergeSummary>
    where
        C: ChainApi + ?Sized,
    {
        let mut summary = MergeSummary::default();
        let mut block_events: HashMap<BlockHash, Vec<EventRecord>> = HashMap::new();

        let pending = best_txs
            .iter()
            .unique_by(|best| (best.block_hash(), best.extrinsic_index()))
            .filter(|best| {
                let seen = self.is_seen(best.block_hash(), best.extrinsic_index());
                summary.skipped += usize::from(seen);
                !seen
            })
            .sorted_by_key(|best| (best.block_number(), best.extrinsic_index()))
            .collect::<Vec<_>>();

        for best in pending {
            let key = (best.block_hash(), best.extrinsic_index());

            let call = match chain.decode_call(best.method()) {
                Ok(call) => call,
                Err(err) => {
                    let attempts = self.decode_failures.entry(key).or_default();
                    *attempts += 1;
                    summary.undecodable += 1;

                    if *attempts >= MAX_DECODE_ATTEMPTS {
                        tracing::warn!(
                            %err,
                            block = best.block_number(),
                            index = best.extrinsic_index(),
                            attempts = *attempts,
                            "skipping undecodable extrinsic",
                        );
                        self.decode_failures.remove(&key);
                        self.seen.insert(key);
                    } else {
                        tracing::debug!(
                            %err,
                            block = best.block_number(),
                            index = best.extrinsic_index(),
                            attempts = *attempts,
                            "undecodable extrinsic, retrying next pass",
                        );
                    }
                    continue;
                },
            };
            self.decode_failures.remove(&key);

            let events = match block_events.entry(best.block_hash()) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => entry.insert(chain.block_events(best.block_hash()).await?),
            };
            let events = events
                .iter()
                .filter(|record| record.applies_to(best.extrinsic_index()))
                .cloned()
                .collect::<Vec<_>>();

            self.register_call(&call);

            let extrinsic = ExtrinsicContext::builder()
                .signer(best.signer())
                .block_hash(best.block_hash())
                .height(best.block_number())
                .index(best.extrinsic_index())
                .events(&events)
                .build();

            let mut cache = StatusCache::new();
            let records = walker::reduce_calldata(
                chain,
                &extrinsic,
                &call,
                &self.known_calls,
                &mut cache,
                |_| (),
            )
            .await?;

            match records.last().and_then(cancel_target) {
                Some((call_hash, multisig)) => match cancelling_of(&events, multisig, call_hash) {
                    Some(cancelling) => {
                        summary.cancelled +=
                            self.cancel_transaction(call_hash, multisig, cancelling)?;
                    },
                    None => tracing::debug!(%call_hash, "cancelAsMulti without MultisigCancelled"),
                },
                None => self.apply_walk(&records, &mut summary)?,
            }

            self.seen.insert(key);
            summary.processed += 1;
        }

        tracing::info!(
            processed = summary.processed,
            skipped = summary.skipped,
            inserted = summary.inserted,
            updated = summary.updated,
            cancelled = summary.cancelled,
            "merged calldata",
        );

        Ok(summary)
    }

    /// Folds one hop into the store.
    ///
    /// The open transaction with the hop's call hash is refined in place, never moving its status
    /// backwards; without one a new transaction is created.
    pub fn insert_or_update(&mut self, record: &CallRecord) -> Result<Upserted> {
        if let Some(call) = record.call() {
            self.register_call(call);
        }

        let Some(index) = self.store.open_by_hash(record.hash()) else {
            let new = NewTransaction::builder()
                .hash(record.hash())
                .maybe_call(record.call().cloned())
                .sender(record.sender())
                .status(record.status())
                .maybe_height(record.height())
                .maybe_extrinsic_index(record.extrinsic_index())
                .build();

            return Ok(Upserted::Inserted(self.store.insert(new)));
        };

        let changed =
            self.store.refine(index, record.status(), record.height(), record.extrinsic_index())?;

        Ok(if changed { Upserted::Updated(index) } else { Upserted::Unchanged(index) })
    }

    /// Cancels the open multisig operation `hash` of `sender`.
    ///
    /// The operation, its child sent by `cancelling`, and every still `Initialized` ancestor up
    /// to the root are marked [`TxStatus::Cancelled`]. Returns how many transactions changed;
    /// nothing matching is not an error.
    #[tracing::instrument(skip(self))]
    pub fn cancel_transaction(
        &mut self,
        hash: CallHash,
        sender: Address,
        cancelling: Address,
    ) -> Result<usize> {
        let matched = self.store.open_by_hash_and_sender(hash, sender).collect::<Vec<_>>();
        if matched.is_empty() {
            tracing::debug!("no open transaction to cancel");
        }

        let mut cancelled = 0;
        for index in matched {
            let children =
                self.store.get(index).map(|tx| tx.children().to_vec()).unwrap_or_default();
            let canceller = children
                .into_iter()
                .filter(|&child| self.store.get(child).is_some_and(|tx| tx.sender() == cancelling))
                .collect::<Vec<_>>();

            let initialized_ancestors = self
                .store
                .ancestors(index)
                .filter(|tx| tx.status() == TxStatus::Initialized)
                .map(|tx| tx.index())
                .collect::<Vec<_>>();

            for target in canceller.into_iter().chain([index]).chain(initialized_ancestors) {
                cancelled += usize::from(self.store.set_status(target, TxStatus::Cancelled)?);
            }
        }

        Ok(cancelled)
    }

    fn apply_walk(&mut self, records: &[CallRecord], summary: &mut MergeSummary) -> Result<()> {
        let mut hops = Vec::with_capacity(records.len());
        let mut child: Option<TxIndex> = None;

        for record in records {
            let upserted = self.insert_or_update(record)?;
            match upserted {
                Upserted::Inserted(_) => summary.inserted += 1,
                Upserted::Updated(_) => summary.updated += 1,
                Upserted::Unchanged(_) => {},
            }

            let index = upserted.index();
            if let Some(child) = child {
                match self.store.link(index, child) {
                    Err(err @ TransactionStoreError::Cycle { .. }) => {
                        tracing::warn!(%err, "not linking hops");
                    },
                    other => other?,
                }
            }

            hops.push((index, matches!(upserted, Upserted::Inserted(_))));
            child = Some(index);
        }

        self.update_init_transactions(&hops)
    }

    fn update_init_transactions(&mut self, hops: &[(TxIndex, bool)]) -> Result<()> {
        let height_of = |store: &TransactionStore, index: TxIndex| {
            store.get(index).and_then(|tx| tx.height())
        };

        let Some((earliest, earliest_height)) = hops
            .iter()
            .filter_map(|&(index, _)| height_of(&self.store, index).map(|height| (index, height)))
            .min_by_key(|&(_, height)| height)
        else {
            return Ok(());
        };

        // the earliest hop may already point at an origin from an earlier pass
        let (target, target_height) = self
            .store
            .get(earliest)
            .map(|tx| tx.init_transaction())
            .and_then(|init| {
                height_of(&self.store, init)
                    .filter(|&height| height <= earliest_height)
                    .map(|height| (init, height))
            })
            .unwrap_or((earliest, earliest_height));

        for &(index, inserted) in hops {
            let current = self.store.get(index).map(|tx| tx.init_transaction()).unwrap_or(index);
            let replace = inserted
                || height_of(&self.store, current).is_none_or(|height| target_height < height);

            if replace && current != target {
                self.store.set_init_transaction(index, target)?;
            }
        }

        Ok(())
    }
}

/// Returns the cancelled call hash and multisig account when the innermost hop of a walk is a
/// `cancelAsMulti`, at any depth.
fn cancel_target(record: &CallRecord) -> Option<(CallHash, Address)> {
    match record.call().map(Call::kind) {
        Some(CallKind::CancelAsMulti { threshold, other_signatories, call_hash, .. })
            if record.is_end() =>
        {
            let multisig = walker::derive_multisig(record.sender(), other_signatories, *threshold);
            Some((*call_hash, multisig))
        },
        _ => None,
    }
}

fn cancelling_of(
    events: &[EventRecord],
    multisig: Address,
    call_hash: CallHash,
) -> Option<Address> {
    events.iter().find_map(|record| match record.event() {
        ChainEvent::MultisigCancelled { cancelling, multisig: m, call_hash: h, .. }
            if *m == multisig && *h == call_hash =>
        {
            Some(*cancelling)
        },
        _ => None,
    })
}
