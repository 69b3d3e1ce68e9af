//! 32-byte account and hash newtypes with their canonical `0x`-prefixed hex form.

use core::{fmt, str::FromStr};

use alloc::string::String;

/// Errors that can occur while parsing an [`Address`] or [`H256`] from text.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    /// The input is not valid hex or does not hold exactly 32 bytes.
    #[error("invalid hex: {0}")]
    Hex(const_hex::FromHexError),
}

impl From<const_hex::FromHexError> for AddressError {
    fn from(err: const_hex::FromHexError) -> Self {
        Self::Hex(err)
    }
}

macro_rules! hex_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(
            feature = "serde",
            derive(serde_with::SerializeDisplay, serde_with::DeserializeFromStr)
        )]
        pub struct $name([u8; 32]);

        impl $name {
            /// Length of the raw value in bytes.
            pub const LEN: usize = 32;

            /// Wraps raw bytes.
            pub const fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Returns the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Returns the `0x`-prefixed lowercase hex form.
            pub fn to_hex(&self) -> String {
                const_hex::encode_prefixed(self.0)
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; 32] {
            fn from($name(bytes): $name) -> Self {
                bytes
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            /// Parses hex text, with or without the `0x` prefix.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                const_hex::decode_to_array(s).map(Self).map_err(From::from)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }
    };
}

hex_newtype!(
    /// A 32-byte account id in its canonical form.
    ///
    /// Multisig accounts, pure proxies and regular keys all share this representation; the
    /// on-chain SS58 text form is a presentation concern and is never used for comparisons.
    Address
);

hex_newtype!(
    /// A 32-byte Blake2b digest, used for call hashes, block hashes and extrinsic hashes.
    H256
);

/// Hash of an encoded call.
pub type CallHash = H256;

/// Hash of a block header.
pub type BlockHash = H256;
