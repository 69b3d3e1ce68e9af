//! In-memory transaction store for the calldata tracker.
//!
//! [`TransactionStore`] is the arena that owns every [`Transaction`] observed during a polling
//! session. Transactions refer to each other by [`TxIndex`]: a transaction's `children` are the
//! wrapping calls that drive it and its `parent` is the call it wraps. A root is its own parent.
//!
//! # Usage
//!
//! ```ignore
//! let mut store = TransactionStore::new();
//!
//! let inner = store.insert(NewTransaction::builder().hash(h).sender(p).status(Pending).build());
//! let outer = store.insert(NewTransaction::builder().hash(o).sender(m).status(Success).build());
//! store.link(inner, outer)?;
//!
//! assert_eq!(store.open_by_hash(h), Some(inner));
//! ```

mod error;


pub use self::error::{Result, TransactionStoreError};

use std::collections::HashMap;

use bon::Builder;
use chrono::Utc;
use multiproxy_calldata_domain::{
    Address, CallHash, Timestamps,
    call::Call,
    tx::{Transaction, TransactionId, TransactionKind, TxIndex, TxStatus},
};
use uuid::Uuid;

/// The observation a new [`Transaction`] is seeded from.
#[derive(Debug, Clone, Builder)]
pub struct NewTransaction {
    hash: CallHash,
    call: Option<Call>,
    sender: Address,
    status: TxStatus,
    height: Option<u32>,
    extrinsic_index: Option<u32>,
}

/// Arena owning every [`Transaction`] of a polling session.
///
/// Transactions are never removed; they only change status. At most one open transaction per
/// call hash is expected, see [`open_by_hash`](Self::open_by_hash).
#[derive(Debug, Default)]
pub struct TransactionStore {
    txs: Vec<Transaction>,
    hash_index: HashMap<CallHash, Vec<TxIndex>>,
}

/// Iterator over the ancestors of a transaction, nearest first, ending at the root.
pub struct Ancestors<'a> {
    store: &'a TransactionStore,
    next: Option<TxIndex>,
    remaining: usize,
}

impl TransactionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of transactions.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Returns `true` if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Returns the transaction at `index`.
    pub fn get(&self, index: TxIndex) -> Option<&Transaction> {
        self.txs.get(index.get())
    }

    /// Returns every transaction in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.txs.iter()
    }

    /// Returns the roots, i.e. the innermost business calls of every tree.
    pub fn roots(&self) -> impl Iterator<Item = &Transaction> {
        self.txs.iter().filter(|tx| tx.is_root())
    }

    /// Returns every transaction ever stored for `hash`, oldest first.
    pub fn by_hash(&self, hash: CallHash) -> impl Iterator<Item = &Transaction> {
        self.hash_index.get(&hash).into_iter().flatten().filter_map(|&index| self.get(index))
    }

    /// Returns the open transaction for `hash`, if any.
    ///
    /// Should two open transactions share a hash, the most recently inserted one wins.
    pub fn open_by_hash(&self, hash: CallHash) -> Option<TxIndex> {
        self.by_hash(hash).filter(|tx| tx.status().is_open()).map(Transaction::index).last()
    }

    /// Returns the open transactions for `hash` issued by `sender`.
    pub fn open_by_hash_and_sender(
        &self,
        hash: CallHash,
        sender: Address,
    ) -> impl Iterator<Item = TxIndex> {
        self.by_hash(hash)
            .filter(move |tx| tx.status().is_open() && tx.sender() == sender)
            .map(Transaction::index)
    }

    /// Returns the ancestors of `index`, nearest first, ending with its root.
    pub fn ancestors(&self, index: TxIndex) -> Ancestors<'_> {
        let next = self.get(index).filter(|tx| !tx.is_root()).map(Transaction::parent);
        Ancestors { store: self, next, remaining: self.txs.len() }
    }

    /// Returns the root of the tree `index` belongs to.
    pub fn root_of(&self, index: TxIndex) -> Option<&Transaction> {
        self.ancestors(index).last().or_else(|| self.get(index))
    }

    /// Stores a new root transaction with a fresh identity and returns its index.
    #[tracing::instrument(skip_all, fields(hash = %new.hash, status = %new.status))]
    pub fn insert(&mut self, new: NewTransaction) -> TxIndex {
        let index = TxIndex::new(self.txs.len());
        let now = Utc::now();

        let tx = Transaction::builder()
            .id(TransactionId::from(Uuid::new_v4()))
            .index(index)
            .hash(new.hash)
            .maybe_call(new.call)
            .sender(new.sender)
            .status(new.status)
            .maybe_height(new.height)
            .maybe_extrinsic_index(new.extrinsic_index)
            .timestamps(Timestamps::builder().created_at(now).updated_at(now).build())
            .build();

        tracing::debug!(%index, id = %tx.id(), "inserted transaction");

        self.hash_index.entry(new.hash).or_default().push(index);
        self.txs.push(tx);
        index
    }

    /// Refines the status and coordinates of the transaction at `index`.
    ///
    /// See [`Transaction::refine`]. Returns `true` if anything changed.
    pub fn refine(
        &mut self,
        index: TxIndex,
        status: TxStatus,
        height: Option<u32>,
        extrinsic_index: Option<u32>,
    ) -> Result<bool> {
        let tx = self.get_mut(index)?;
        let changed = tx.refine(status, height, extrinsic_index);
        if changed {
            touch(tx);
        }
        Ok(changed)
    }

    /// Overwrites the status of the transaction at `index`. Returns `true` if it changed.
    pub fn set_status(&mut self, index: TxIndex, status: TxStatus) -> Result<bool> {
        let tx = self.get_mut(index)?;
        if tx.status() == status {
            return Ok(false);
        }

        tx.set_status(status);
        touch(tx);
        Ok(true)
    }

    /// Fills in the call data of the transaction at `index` if it was unknown.
    pub fn fill_call(&mut self, index: TxIndex, call: &Call) -> Result<bool> {
        let tx = self.get_mut(index)?;
        let filled = tx.fill_call(call);
        if filled {
            touch(tx);
        }
        Ok(filled)
    }

    /// Fills in `call` on every stored transaction with its hash that still lacks call data.
    ///
    /// Returns how many transactions were filled.
    pub fn fill_call_by_hash(&mut self, call: &Call) -> usize {
        let Some(indices) = self.hash_index.get(&call.hash()) else {
            return 0;
        };

        let mut filled = 0;
        for index in indices {
            let Some(tx) = self.txs.get_mut(index.get()) else {
                continue;
            };
            if tx.fill_call(call) {
                touch(tx);
                filled += 1;
            }
        }
        filled
    }

    /// Points the transaction at `index` to `init_transaction` as its earliest known hop.
    pub fn set_init_transaction(
        &mut self,
        index: TxIndex,
        init_transaction: TxIndex,
    ) -> Result<()> {
        if self.get(init_transaction).is_none() {
            return Err(TransactionStoreError::NotFound(init_transaction));
        }

        self.get_mut(index)?.set_init_transaction(init_transaction);
        Ok(())
    }

    /// Links `child` as a wrapping call driving `parent`.
    ///
    /// A child already linked elsewhere is moved. The parent's [`TransactionKind`] and delegate
    /// are derived from the child's call: a proxy child makes the parent delegated to the child's
    /// sender.
    #[tracing::instrument(skip(self))]
    pub fn link(&mut self, parent: TxIndex, child: TxIndex) -> Result<()> {
        let child_tx = self.get(child).ok_or(TransactionStoreError::NotFound(child))?;
        self.get(parent).ok_or(TransactionStoreError::NotFound(parent))?;

        if parent == child || self.ancestors(parent).any(|tx| tx.index() == child) {
            return Err(TransactionStoreError::Cycle { parent, child });
        }

        let previous = (!child_tx.is_root()).then(|| child_tx.parent());
        let wrapper = child_tx.call().and_then(TransactionKind::of_wrapper);
        let child_sender = child_tx.sender();

        if let Some(previous) = previous.filter(|&previous| previous != parent) {
            tracing::debug!(%previous, "moving child to a new parent");
            self.get_mut(previous)?.remove_child(child);
        }

        self.get_mut(child)?.set_parent(parent);

        let parent_tx = self.get_mut(parent)?;
        parent_tx.push_child(child);
        if let Some(kind) = wrapper {
            parent_tx.set_kind(kind, kind.is_delegated().then_some(child_sender));
        }

        Ok(())
    }

    fn get_mut(&mut self, index: TxIndex) -> Result<&mut Transaction> {
        self.txs.get_mut(index.get()).ok_or(TransactionStoreError::NotFound(index))
    }
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Transaction;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let tx = self.store.get(self.next?)?;
        self.next = (!tx.is_root()).then(|| tx.parent());
        Some(tx)
    }
}

fn touch(tx: &mut Transaction) {
    let timestamps = tx.timestamps().touched(Utc::now());
    tx.set_timestamps(timestamps);
}
