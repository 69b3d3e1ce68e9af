use blake2::{Blake2b, Digest, digest::consts::U32};
use multiproxy_calldata_domain::CallHash;

type Blake2b256 = Blake2b<U32>;

/// Blake2b with a 256-bit output, the hasher used for call hashes and account derivation.
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hashes a SCALE-encoded call the way multisig storage and events key it.
pub fn call_hash(encoded_call: &[u8]) -> CallHash {
    CallHash::new(blake2_256(encoded_call))
}
