//! Domain types for the multisig/proxy calldata tracker.
//!
//! This crate provides the core models shared by the calldata reduction engine: decoded calls
//! and events of the `multisig` and `proxy` pallets, the per-hop [`CallRecord`](record::CallRecord)
//! produced by a chain walk, the deduplicated [`Transaction`](tx::Transaction) kept by the merger,
//! and the account ownership tree walked by the signing-path finder.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod account;
pub mod address;
pub mod best_tx;
pub mod call;
pub mod event;
pub mod path;
pub mod record;
pub mod tx;

#[cfg(feature = "serde")]
mod with_serde;

#[cfg(test)]
mod tests;

pub use self::address::{Address, AddressError, BlockHash, CallHash, H256};

use bon::Builder;
use chrono::{DateTime, Utc};
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timestamp metadata for tracking when a transaction was first observed and last refined.
#[derive(Debug, Clone, Copy, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamps {
    /// The timestamp when the entity was created.
    created_at: DateTime<Utc>,
    /// The timestamp when the entity was last updated.
    updated_at: DateTime<Utc>,
}

impl Timestamps {
    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy with the update timestamp moved to `now`.
    pub fn touched(self, now: DateTime<Utc>) -> Self {
        Self { created_at: self.created_at, updated_at: now }
    }
}
