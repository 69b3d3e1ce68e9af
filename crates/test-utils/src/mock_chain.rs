use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash, H256,
    best_tx::BestTx,
    call::{Call, Timepoint},
    event::{ChainEvent, EventRecord, Phase},
};
use multiproxy_calldata_engine::{BestTxSource, ChainApi, ChainError};

use crate::block_hash;

/// An in-memory chain and indexer.
///
/// Calls are "encoded" as their hash bytes, so every submitted call decodes back to itself.
/// Failures can be switched on per query kind to exercise retry paths.
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    calls: HashMap<Vec<u8>, Call>,
    events: HashMap<BlockHash, Vec<EventRecord>>,
    multisigs: HashMap<(Address, CallHash), Timepoint>,
    best_txs: Vec<BestTx>,
    fail_events: bool,
    fail_storage: bool,
    fail_best_txs: bool,
    event_queries: usize,
    storage_queries: usize,
}

impl MockChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Includes `call` signed by `signer` at `(height, index)` emitting `events`, and reports it
    /// to the indexer. Returns the indexer record.
    pub fn submit(
        &self,
        signer: Address,
        height: u32,
        index: u32,
        call: &Call,
        events: Vec<ChainEvent>,
    ) -> BestTx {
        let method = call.hash().as_bytes().to_vec();
        self.state().calls.insert(method.clone(), call.clone());
        self.include(signer, height, index, method, events)
    }

    /// Includes an extrinsic whose call bytes do not decode.
    pub fn submit_undecodable(&self, signer: Address, height: u32, index: u32) -> BestTx {
        self.include(signer, height, index, vec![0xde, 0xad], vec![ChainEvent::ExtrinsicSuccess])
    }

    /// Includes `call` like [`MockChain::submit`], but it only decodes once
    /// [`MockChain::learn_call`] is called, as after a metadata update.
    pub fn submit_unknown(
        &self,
        signer: Address,
        height: u32,
        index: u32,
        call: &Call,
        events: Vec<ChainEvent>,
    ) -> BestTx {
        self.include(signer, height, index, call.hash().as_bytes().to_vec(), events)
    }

    /// Makes `call` decodable.
    pub fn learn_call(&self, call: &Call) {
        self.state().calls.insert(call.hash().as_bytes().to_vec(), call.clone());
    }

    fn include(
        &self,
        signer: Address,
        height: u32,
        index: u32,
        method: Vec<u8>,
        events: Vec<ChainEvent>,
    ) -> BestTx {
        let best = BestTx::builder()
            .addresses(vec![signer])
            .block_number(height)
            .block_hash(block_hash(height))
            .extrinsic_hash(H256::new([index as u8; 32]))
            .extrinsic_index(index)
            .genesis_hash(block_hash(0))
            .method(method)
            .signer(signer)
            .build();

        let mut state = self.state();
        state.events.entry(block_hash(height)).or_default().extend(
            events.into_iter().map(|event| EventRecord::new(Phase::ApplyExtrinsic(index), event)),
        );
        state.best_txs.push(best.clone());

        best
    }

    /// Adds events to a block without an extrinsic, e.g. emitted by other extrinsics.
    pub fn push_events(&self, height: u32, records: Vec<EventRecord>) {
        self.state().events.entry(block_hash(height)).or_default().extend(records);
    }

    /// Sets `multisig.multisigs(multisig, call_hash)` to an operation opened at `when`.
    pub fn open_multisig(&self, multisig: Address, call_hash: CallHash, when: Timepoint) {
        self.state().multisigs.insert((multisig, call_hash), when);
    }

    /// Makes every block event query fail while `fail` is set.
    pub fn fail_event_queries(&self, fail: bool) {
        self.state().fail_events = fail;
    }

    /// Makes every multisig storage query fail while `fail` is set.
    pub fn fail_storage_queries(&self, fail: bool) {
        self.state().fail_storage = fail;
    }

    /// Makes every indexer query fail while `fail` is set.
    pub fn fail_best_tx_queries(&self, fail: bool) {
        self.state().fail_best_txs = fail;
    }

    /// Returns how many block event queries were answered.
    pub fn event_queries(&self) -> usize {
        self.state().event_queries
    }

    /// Returns how many multisig storage queries were answered.
    pub fn storage_queries(&self) -> usize {
        self.state().storage_queries
    }

    /// Returns every extrinsic reported to the indexer so far.
    pub fn reported(&self) -> Vec<BestTx> {
        self.state().best_txs.clone()
    }
}

impl ChainApi for MockChain {
    fn decode_call(&self, encoded: &[u8]) -> Result<Call, ChainError> {
        self.state()
            .calls
            .get(encoded)
            .cloned()
            .ok_or_else(|| ChainError::decode(format!("unknown call of {} bytes", encoded.len())))
    }

    fn block_events(
        &self,
        block_hash: BlockHash,
    ) -> impl Future<Output = Result<Vec<EventRecord>, ChainError>> + Send {
        let mut state = self.state();
        let result = if state.fail_events {
            Err(ChainError::query("events unavailable"))
        } else {
            state.event_queries += 1;
            Ok(state.events.get(&block_hash).cloned().unwrap_or_default())
        };

        async move { result }
    }

    fn multisig_timepoint(
        &self,
        multisig: Address,
        call_hash: CallHash,
        _at: BlockHash,
    ) -> impl Future<Output = Result<Option<Timepoint>, ChainError>> + Send {
        let mut state = self.state();
        let result = if state.fail_storage {
            Err(ChainError::query("storage unavailable"))
        } else {
            state.storage_queries += 1;
            Ok(state.multisigs.get(&(multisig, call_hash)).copied())
        };

        async move { result }
    }
}

impl BestTxSource for MockChain {
    fn best_txs(
        &self,
        addresses: &[Address],
    ) -> impl Future<Output = Result<Vec<BestTx>, ChainError>> + Send {
        let state = self.state();
        let result = if state.fail_best_txs {
            Err(ChainError::query("indexer unavailable"))
        } else {
            let best_txs = state
                .best_txs
                .iter()
                .filter(|best| {
                    addresses.is_empty()
                        || best.addresses().iter().any(|address| addresses.contains(address))
                })
                .cloned()
                .collect();
            Ok(best_txs)
        };

        async move { result }
    }
}
