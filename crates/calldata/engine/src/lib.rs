//! Reconstruction of multisig and proxy transaction trees from on-chain calldata.
//!
//! The engine turns the flat extrinsics reported by an indexing service into logical
//! transactions and tells which locally controlled keys can progress them.
//!
//! # Main Components
//!
//! - [`reduce_calldata`] - walks one extrinsic's nested `multisig`/`proxy` calls hop by hop and
//!   classifies each hop from the extrinsic's events and multisig storage
//! - [`TransactionMerger`] - folds chain walks into a deduplicated [`TransactionStore`] tree and
//!   applies `cancelAsMulti` cancellations
//! - [`find_filter_paths`] - enumerates the proxy/multisig paths from an account down to a key the
//!   local signer holds
//! - [`Poller`] - re-runs the merger on a fixed interval
//!
//! Chain access goes through the [`ChainApi`] and [`BestTxSource`] capabilities so the engine
//! never deals with RPC transport itself.
//!
//! [`TransactionStore`]: multiproxy_calldata_store::TransactionStore

mod chain;
mod classifier;
mod error;
mod filter_paths;
mod merger;
mod poller;
mod walker;

pub use self::{
    chain::{CallResolver, ChainApi, ChainError},
    classifier::{HopStatus, ProxyEventCursor, StatusCache, classify_multisig, classify_proxy},
    error::{CalldataEngineError, CalldataEngineErrorKind, Result},
    filter_paths::{AccountSource, PendingTx, find_filter_paths},
    merger::{MAX_DECODE_ATTEMPTS, MergeSummary, TransactionMerger, Upserted},
    poller::{BestTxSource, Poller, PollerConfig},
    walker::{ExtrinsicContext, reduce_calldata},
};
