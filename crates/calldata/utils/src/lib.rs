//! utils crate for the multisig/proxy calldata tracker.

mod hashing;
mod multisig;

pub use self::{
    hashing::{blake2_256, call_hash},
    multisig::multisig_address,
};
