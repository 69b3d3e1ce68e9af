//! A recorded chain read from a JSON file.
//!
//! The file stands in for both the chain client and the indexing service: it lists the best
//! extrinsics together with their decoded calls, the event records of every block, the open
//! multisig operations and the account trees to report signing paths for.
//!
//! Multisig storage is answered per block when a block records its own `multisigs`, and from the
//! top-level `multisigs`, the latest state, otherwise.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard},
};

use bon::Builder;
use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash,
    account::AccountData,
    best_tx::BestTx,
    call::{Call, Timepoint},
    event::EventRecord,
};
use multiproxy_calldata_engine::{BestTxSource, ChainApi, ChainError};
use serde::{Deserialize, Serialize};

/// The on-disk layout of a chain snapshot.
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    #[builder(default)]
    #[serde(default)]
    extrinsics: Vec<RecordedExtrinsic>,

    #[builder(default)]
    #[serde(default)]
    blocks: Vec<RecordedBlock>,

    #[builder(default)]
    #[serde(default)]
    multisigs: Vec<RecordedMultisig>,

    #[builder(default)]
    #[serde(default)]
    accounts: Vec<AccountData>,
}

/// A best extrinsic with its call as the chain client decoded it.
///
/// A missing `call` records bytes the client could not decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedExtrinsic {
    #[serde(flatten)]
    best: BestTx,
    #[serde(default)]
    call: Option<Call>,
}

/// Every event record of one block, and optionally its multisig storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedBlock {
    hash: BlockHash,
    events: Vec<EventRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    multisigs: Option<Vec<RecordedMultisig>>,
}

/// An entry of `multisig.multisigs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMultisig {
    multisig: Address,
    call_hash: CallHash,
    when: Timepoint,
}

impl RecordedExtrinsic {
    /// Records `best`, decoding to `call` when known.
    pub fn new(best: BestTx, call: Option<Call>) -> Self {
        Self { best, call }
    }
}

impl RecordedBlock {
    /// Records the events of block `hash`.
    pub fn new(hash: BlockHash, events: Vec<EventRecord>) -> Self {
        Self { hash, events, multisigs: None }
    }

    /// Records the open multisig operations as of this block.
    pub fn with_multisigs(mut self, multisigs: Vec<RecordedMultisig>) -> Self {
        self.multisigs = Some(multisigs);
        self
    }
}

impl RecordedMultisig {
    /// Records the operation `call_hash` of `multisig` opened at `when`.
    pub fn new(multisig: Address, call_hash: CallHash, when: Timepoint) -> Self {
        Self { multisig, call_hash, when }
    }
}

/// A [`Recording`] indexed for lookups.
#[derive(Debug, Default)]
pub struct ChainSnapshot {
    best_txs: Vec<BestTx>,
    calls: HashMap<Vec<u8>, Call>,
    events: HashMap<BlockHash, Vec<EventRecord>>,
    multisigs: MultisigStorage,
    block_multisigs: HashMap<BlockHash, MultisigStorage>,
    accounts: Vec<AccountData>,
}

type MultisigStorage = HashMap<(Address, CallHash), Timepoint>;

fn multisig_storage(entries: Vec<RecordedMultisig>) -> MultisigStorage {
    entries.into_iter().map(|entry| ((entry.multisig, entry.call_hash), entry.when)).collect()
}

impl From<Recording> for ChainSnapshot {
    fn from(recording: Recording) -> Self {
        let mut snapshot = ChainSnapshot::default();

        for RecordedExtrinsic { best, call } in recording.extrinsics {
            if let Some(call) = call {
                snapshot.calls.insert(best.method().to_vec(), call);
            }
            snapshot.best_txs.push(best);
        }

        for RecordedBlock { hash, events, multisigs } in recording.blocks {
            snapshot.events.entry(hash).or_default().extend(events);
            if let Some(multisigs) = multisigs {
                snapshot.block_multisigs.insert(hash, multisig_storage(multisigs));
            }
        }

        snapshot.multisigs = multisig_storage(recording.multisigs);
        snapshot.accounts = recording.accounts;

        snapshot
    }
}

impl ChainSnapshot {
    /// Returns the recorded account trees.
    pub fn accounts(&self) -> &[AccountData] {
        &self.accounts
    }
}

/// A [`ChainApi`] and [`BestTxSource`] served from a snapshot file.
///
/// Every [`BestTxSource::best_txs`] call re-reads the file, so extrinsics appended between polls
/// are picked up. The chain queries of a poll answer from the snapshot read at its start.
#[derive(Debug)]
pub struct SnapshotChain {
    path: PathBuf,
    snapshot: RwLock<ChainSnapshot>,
}

impl SnapshotChain {
    /// Reads the snapshot at `path`.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or parsed
    pub async fn open<P>(path: P) -> Result<Self, ChainError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let snapshot = read_snapshot(&path).await?;
        tracing::debug!(path = %path.display(), "opened chain snapshot");

        Ok(Self { path, snapshot: RwLock::new(snapshot) })
    }

    /// Re-reads the snapshot file.
    ///
    /// # Errors
    ///
    /// If the file cannot be read or parsed; the previous snapshot is kept then.
    pub async fn reload(&self) -> Result<(), ChainError> {
        let snapshot = read_snapshot(&self.path).await?;
        let mut current =
            self.snapshot.write().map_err(|_| ChainError::other("snapshot lock poisoned"))?;
        *current = snapshot;
        Ok(())
    }

    /// Returns the account trees of the current snapshot.
    ///
    /// # Errors
    ///
    /// If the snapshot lock is poisoned
    pub fn accounts(&self) -> Result<Vec<AccountData>, ChainError> {
        Ok(self.read()?.accounts().to_vec())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ChainSnapshot>, ChainError> {
        self.snapshot.read().map_err(|_| ChainError::other("snapshot lock poisoned"))
    }
}

impl ChainApi for SnapshotChain {
    fn decode_call(&self, encoded: &[u8]) -> Result<Call, ChainError> {
        self.read()?
            .calls
            .get(encoded)
            .cloned()
            .ok_or_else(|| ChainError::decode(format!("no recorded call for {encoded:02x?}")))
    }

    fn block_events(
        &self,
        block_hash: BlockHash,
    ) -> impl Future<Output = Result<Vec<EventRecord>, ChainError>> + Send {
        let result = self
            .read()
            .map(|snapshot| snapshot.events.get(&block_hash).cloned().unwrap_or_default());

        async move { result }
    }

    fn multisig_timepoint(
        &self,
        multisig: Address,
        call_hash: CallHash,
        at: BlockHash,
    ) -> impl Future<Output = Result<Option<Timepoint>, ChainError>> + Send {
        let result = self.read().map(|snapshot| {
            snapshot
                .block_multisigs
                .get(&at)
                .unwrap_or(&snapshot.multisigs)
                .get(&(multisig, call_hash))
                .copied()
        });

        async move { result }
    }
}

impl BestTxSource for SnapshotChain {
    fn best_txs(
        &self,
        addresses: &[Address],
    ) -> impl Future<Output = Result<Vec<BestTx>, ChainError>> + Send {
        async move {
            self.reload().await?;

            let snapshot = self.read()?;
            let best_txs = snapshot
                .best_txs
                .iter()
                .filter(|best| {
                    addresses.is_empty()
                        || best.addresses().iter().any(|address| addresses.contains(address))
                })
                .cloned()
                .collect();

            Ok(best_txs)
        }
    }
}

async fn read_snapshot(path: &Path) -> Result<ChainSnapshot, ChainError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| ChainError::query(format!("reading {}: {err}", path.display())))?;
    let recording: Recording = serde_json::from_slice(&bytes)
        .map_err(|err| ChainError::query(format!("parsing {}: {err}", path.display())))?;

    Ok(recording.into())
}
