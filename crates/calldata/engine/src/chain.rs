//! Capabilities the engine needs from a chain client.

mod error;

pub use self::error::ChainError;

use std::{collections::HashMap, hash::BuildHasher};

use multiproxy_calldata_domain::{
    Address, BlockHash, CallHash,
    call::{Call, Timepoint},
    event::EventRecord,
};

/// Read access to a chain, as provided by a chain client library.
///
/// Decoding is synchronous since it only needs the runtime metadata the client already holds;
/// event and storage reads go over the network.
pub trait ChainApi {
    /// Decodes SCALE-encoded call bytes, computing the call hash alongside.
    fn decode_call(&self, encoded: &[u8]) -> Result<Call, ChainError>;

    /// Returns every event record of the block `block_hash`.
    fn block_events(
        &self,
        block_hash: BlockHash,
    ) -> impl Future<Output = Result<Vec<EventRecord>, ChainError>> + Send;

    /// Reads `multisig.multisigs(multisig, call_hash)` at block `at`, returning the `when`
    /// timepoint of the open operation if there is one.
    fn multisig_timepoint(
        &self,
        multisig: Address,
        call_hash: CallHash,
        at: BlockHash,
    ) -> impl Future<Output = Result<Option<Timepoint>, ChainError>> + Send;
}

/// Resolves a call hash to previously seen call data.
pub trait CallResolver {
    /// Returns the call with hash `hash`, if known.
    fn resolve(&self, hash: CallHash) -> Option<&Call>;
}

impl<S> CallResolver for HashMap<CallHash, Call, S>
where
    S: BuildHasher,
{
    fn resolve(&self, hash: CallHash) -> Option<&Call> {
        self.get(&hash)
    }
}

impl<T> ChainApi for &T
where
    T: ChainApi + ?Sized,
{
    fn decode_call(&self, encoded: &[u8]) -> Result<Call, ChainError> {
        (**self).decode_call(encoded)
    }

    fn block_events(
        &self,
        block_hash: BlockHash,
    ) -> impl Future<Output = Result<Vec<EventRecord>, ChainError>> + Send {
        (**self).block_events(block_hash)
    }

    fn multisig_timepoint(
        &self,
        multisig: Address,
        call_hash: CallHash,
        at: BlockHash,
    ) -> impl Future<Output = Result<Option<Timepoint>, ChainError>> + Send {
        (**self).multisig_timepoint(multisig, call_hash, at)
    }
}
