//! One hop of a chain walk.

use bon::Builder;
use dissolve_derive::Dissolve;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Address, CallHash, call::Call, tx::TxStatus};

/// The status of one call in a nested call chain, as derived while unwrapping an extrinsic.
///
/// `depth` 0 is the call submitted by the extrinsic signer. A record without a `call` is an
/// `approveAsMulti` target whose call data is unknown; it is tracked by `hash` only and is always
/// the last hop of its walk.
#[derive(Debug, Clone, Builder, Dissolve)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CallRecord {
    call: Option<Call>,
    hash: CallHash,
    sender: Address,
    is_start: bool,
    is_end: bool,
    status: TxStatus,
    height: Option<u32>,
    extrinsic_index: Option<u32>,
    depth: usize,
}

impl CallRecord {
    /// Returns the decoded call, when known.
    pub fn call(&self) -> Option<&Call> {
        self.call.as_ref()
    }

    /// Returns the call hash.
    pub fn hash(&self) -> CallHash {
        self.hash
    }

    /// Returns the account nominally issuing this call.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Returns `true` for the submitted, outermost call.
    pub fn is_start(&self) -> bool {
        self.is_start
    }

    /// Returns `true` for the innermost call of the walk.
    pub fn is_end(&self) -> bool {
        self.is_end
    }

    /// Returns the derived status.
    pub fn status(&self) -> TxStatus {
        self.status
    }

    /// Returns the block height where the status was confirmed.
    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Returns the extrinsic index where the status was confirmed.
    pub fn extrinsic_index(&self) -> Option<u32> {
        self.extrinsic_index
    }

    /// Returns the hop depth, 0 being the submitted call.
    pub fn depth(&self) -> usize {
        self.depth
    }
}
