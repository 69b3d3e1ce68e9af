//! Deterministic multisig account derivation.

use itertools::Itertools;
use multiproxy_calldata_domain::Address;
use parity_scale_codec::Encode;

use crate::blake2_256;

const MULTISIG_PREFIX: [u8; 16] = *b"modlpy/utilisuba";

/// Derives the multisig account for `signatories` at `threshold`.
///
/// Signatories are sorted and deduplicated first, so the result does not depend on the order the
/// caller lists them in. The preimage is the SCALE encoding of
/// `(b"modlpy/utilisuba", sorted_signatories, threshold)`.
pub fn multisig_address(signatories: &[Address], threshold: u16) -> Address {
    let sorted: Vec<[u8; 32]> =
        signatories.iter().sorted().dedup().map(|signatory| *signatory.as_bytes()).collect();

    let preimage = (MULTISIG_PREFIX, sorted, threshold).encode();
    Address::new(blake2_256(&preimage))
}
