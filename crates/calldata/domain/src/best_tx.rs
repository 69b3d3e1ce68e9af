//! Finalized extrinsics reported by the indexing service.

use alloc::vec::Vec;

use bon::Builder;
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, BlockHash, H256};

#[cfg(feature = "serde")]
use crate::with_serde;

/// A best-known extrinsic touching one of the watched addresses.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "camelCase"))]
pub struct BestTx {
    /// The watched addresses this extrinsic involves.
    #[builder(default)]
    addresses: Vec<Address>,

    /// Height of the including block.
    block_number: u32,

    /// Hash of the including block.
    block_hash: BlockHash,

    /// Hash of the extrinsic.
    extrinsic_hash: H256,

    /// Index of the extrinsic within the block.
    extrinsic_index: u32,

    /// Genesis hash of the chain.
    genesis_hash: BlockHash,

    /// SCALE-encoded call of the extrinsic.
    #[cfg_attr(feature = "serde", serde(with = "with_serde::hex_bytes"))]
    method: Vec<u8>,

    /// The extrinsic signer.
    signer: Address,
}

impl BestTx {
    /// Returns the watched addresses this extrinsic involves.
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Returns the height of the including block.
    pub fn block_number(&self) -> u32 {
        self.block_number
    }

    /// Returns the hash of the including block.
    pub fn block_hash(&self) -> BlockHash {
        self.block_hash
    }

    /// Returns the extrinsic hash.
    pub fn extrinsic_hash(&self) -> H256 {
        self.extrinsic_hash
    }

    /// Returns the index of the extrinsic within its block.
    pub fn extrinsic_index(&self) -> u32 {
        self.extrinsic_index
    }

    /// Returns the genesis hash of the chain.
    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis_hash
    }

    /// Returns the SCALE-encoded call.
    pub fn method(&self) -> &[u8] {
        &self.method
    }

    /// Returns the extrinsic signer.
    pub fn signer(&self) -> Address {
        self.signer
    }
}
