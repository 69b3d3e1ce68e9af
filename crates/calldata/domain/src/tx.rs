//! Logical transaction models and status tracking.

use core::fmt;

use alloc::vec::Vec;

use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, CallHash, Timestamps, call::Call};

/// A unique identifier for a logical transaction.
///
/// This is a wrapper around a UUID that provides type safety and
/// seamless conversion to/from UUID values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TransactionId(Uuid);

/// Position of a [`Transaction`] inside the store that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TxIndex(usize);

/// The lifecycle status of a call.
///
/// Variants are ordered: everything below [`TxStatus::Success`] is still open, everything from
/// it upwards is terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, IntoStaticStr, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TxStatus {
    /// Known to exist but not yet dispatched or approved on chain.
    Initialized,
    /// Approvals are being collected.
    Pending,
    /// Dispatched and the inner call succeeded.
    Success,
    /// Dispatched and the inner call failed.
    Failed,
    /// The multisig membership changed underneath the operation.
    MemberChanged,
    /// The operation was cancelled.
    Cancelled,
}

/// How a transaction is being driven by its children.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoStaticStr, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum TransactionKind {
    /// No wrapping call observed yet.
    #[default]
    Unknown,
    /// Approved by multisig members.
    Multisig,
    /// Dispatched by a proxy delegate.
    Proxy,
    /// Announced by a time-delayed proxy delegate.
    Announce,
}

/// A deduplicated, status-tracked logical transaction.
///
/// Transactions live in an arena owned by the store; `parent`, `children` and
/// `init_transaction` are indices into that arena. A root points at itself as its own parent.
///
/// `children` are the wrapping calls that drive this one, e.g. the `approveAsMulti` of each
/// member or the `proxy.proxy` of a delegate.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transaction {
    id: TransactionId,
    index: TxIndex,
    hash: CallHash,
    call: Option<Call>,
    sender: Address,
    status: TxStatus,
    height: Option<u32>,
    extrinsic_index: Option<u32>,
    kind: TransactionKind,
    delegate: Option<Address>,
    parent: TxIndex,
    children: Vec<TxIndex>,
    init_transaction: TxIndex,
    timestamps: Timestamps,
}

impl TxStatus {
    /// Returns `true` while the status can still change, i.e. below [`TxStatus::Success`].
    pub fn is_open(self) -> bool {
        self < TxStatus::Success
    }
}

impl TransactionKind {
    /// Returns the kind a wrapping `call` gives to the call it wraps, if it is a wrapper.
    pub fn of_wrapper(call: &Call) -> Option<Self> {
        match (call.section(), call.method()) {
            ("multisig", "asMulti" | "approveAsMulti" | "asMultiThreshold1") => {
                Some(TransactionKind::Multisig)
            },
            ("proxy", "proxy") => Some(TransactionKind::Proxy),
            ("proxy", "proxyAnnounced" | "announce") => Some(TransactionKind::Announce),
            _ => None,
        }
    }

    /// Returns `true` for the kinds dispatched through a proxy delegate.
    pub fn is_delegated(self) -> bool {
        matches!(self, TransactionKind::Proxy | TransactionKind::Announce)
    }
}

#[bon::bon]
impl Transaction {
    /// Creates a root transaction stored at `index`.
    ///
    /// The new transaction is its own parent and its own originating hop until the store links
    /// it into a tree.
    #[builder]
    pub fn new(
        id: TransactionId,
        index: TxIndex,
        hash: CallHash,
        call: Option<Call>,
        sender: Address,
        status: TxStatus,
        height: Option<u32>,
        extrinsic_index: Option<u32>,
        #[builder(default)] kind: TransactionKind,
        delegate: Option<Address>,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            index,
            hash,
            call,
            sender,
            status,
            height,
            extrinsic_index,
            kind,
            delegate,
            parent: index,
            children: Vec::new(),
            init_transaction: index,
            timestamps,
        }
    }
}

impl Transaction {
    /// Returns the unique identifier.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the position of this transaction in its store.
    pub fn index(&self) -> TxIndex {
        self.index
    }

    /// Returns the call hash.
    pub fn hash(&self) -> CallHash {
        self.hash
    }

    /// Returns the decoded call, when known.
    pub fn call(&self) -> Option<&Call> {
        self.call.as_ref()
    }

    /// Returns the account nominally issuing the call.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Returns the current status.
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Returns the block height where the status was last confirmed.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Returns the extrinsic index where the status was last confirmed.
    pub fn extrinsic_index(&self) -> Option<u32> {
        self.extrinsic_index
    }

    /// Returns how this transaction is being driven.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Returns the proxy delegate driving this transaction, for delegated kinds.
    pub fn delegate(&self) -> Option<Address> {
        self.delegate
    }

    /// Returns the parent index; equal to [`index`](Self::index) for a root.
    pub fn parent(&self) -> TxIndex {
        self.parent
    }

    /// Returns `true` if this transaction is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent == self.index
    }

    /// Returns the indices of the wrapping calls driving this transaction.
    pub fn children(&self) -> &[TxIndex] {
        &self.children
    }

    /// Returns the index of the earliest known hop of the chain this transaction belongs to.
    pub fn init_transaction(&self) -> TxIndex {
        self.init_transaction
    }

    /// Returns the creation and update timestamps.
    pub fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    /// Records newer knowledge about the status and block coordinates.
    ///
    /// The status never moves backwards and coordinates are only overwritten with known values.
    /// Returns `true` if anything changed.
    pub fn refine(
        &mut self,
        status: TxStatus,
        height: Option<u32>,
        extrinsic_index: Option<u32>,
    ) -> bool {
        let mut changed = false;

        if status > self.status {
            self.status = status;
            changed = true;
        }

        if height.is_some() && height != self.height {
            self.height = height;
            self.extrinsic_index = extrinsic_index;
            changed = true;
        }

        changed
    }

    /// Overwrites the status unconditionally.
    pub fn set_status(&mut self, status: TxStatus) {
        self.status = status;
    }

    /// Fills in the decoded call if it was not known yet. Returns `true` if it was set.
    pub fn fill_call(&mut self, call: &Call) -> bool {
        if self.call.is_some() || call.hash() != self.hash {
            return false;
        }

        self.call = Some(call.clone());
        true
    }

    /// Sets the parent index.
    pub fn set_parent(&mut self, parent: TxIndex) {
        self.parent = parent;
    }

    /// Adds a child index unless it is already present. Returns `true` if it was added.
    pub fn push_child(&mut self, child: TxIndex) -> bool {
        if self.children.contains(&child) {
            return false;
        }

        self.children.push(child);
        true
    }

    /// Removes a child index. Returns `true` if it was present.
    pub fn remove_child(&mut self, child: TxIndex) -> bool {
        let before = self.children.len();
        self.children.retain(|&index| index != child);
        self.children.len() != before
    }

    /// Sets how this transaction is driven, along with the delegate for delegated kinds.
    pub fn set_kind(&mut self, kind: TransactionKind, delegate: Option<Address>) {
        self.kind = kind;
        self.delegate = delegate;
    }

    /// Sets the earliest known hop.
    pub fn set_init_transaction(&mut self, init_transaction: TxIndex) {
        self.init_transaction = init_transaction;
    }

    /// Replaces the timestamps.
    pub fn set_timestamps(&mut self, timestamps: Timestamps) {
        self.timestamps = timestamps;
    }
}

impl From<Uuid> for TransactionId {
    /// Converts a UUID into a `TransactionId`.
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TransactionId> for Uuid {
    /// Converts a `TransactionId` into its underlying UUID.
    fn from(TransactionId(uuid): TransactionId) -> Self {
        uuid
    }
}

impl fmt::Display for TransactionId {
    /// Formats the `TransactionId` as its underlying UUID string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TxIndex {
    /// Wraps a raw arena position.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw arena position.
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for TxIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
