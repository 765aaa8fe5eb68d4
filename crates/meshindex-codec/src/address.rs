//! Fixed-width identifiers and content-address derivation.

use std::fmt;
use std::str::FromStr;

use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Width of an account address in bytes.
pub const ADDRESS_LENGTH: usize = 24;
/// Leading bytes of an address reserved for the network header (always zero
/// for derived addresses).
pub const ADDRESS_RESERVED: usize = 4;
/// Width of an ed25519 public key.
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Width of one signature block.
pub const SIGNATURE_LENGTH: usize = 64;
/// Width of a blake3 digest.
pub const HASH_LENGTH: usize = 32;

/// Parse a `0x`-prefixed (or bare) hex string into a fixed-size array.
fn parse_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| ParseError(e.to_string()))?;
    <[u8; N]>::try_from(bytes.as_slice())
        .map_err(|_| ParseError(format!("expected {N} bytes, got {}", bytes.len())))
}

/// Error returned when parsing a hex identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex identifier: {0}")]
pub struct ParseError(String);

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        /// Encodes on the wire as its raw bytes, with no length prefix.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_fixed::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_bytes!(
    /// A 24-byte account or template address.
    Address,
    ADDRESS_LENGTH
);

fixed_bytes!(
    /// An ed25519 public key.
    PublicKey,
    PUBLIC_KEY_LENGTH
);

fixed_bytes!(
    /// A blake3 digest.
    Hash32,
    HASH_LENGTH
);

impl Address {
    /// Build an address from the last 20 bytes of a digest, leaving the
    /// reserved header zeroed.
    pub fn from_digest(digest: &Hash32) -> Self {
        let mut out = [0u8; ADDRESS_LENGTH];
        let tail = ADDRESS_LENGTH - ADDRESS_RESERVED;
        out[ADDRESS_RESERVED..].copy_from_slice(&digest.0[HASH_LENGTH - tail..]);
        Self(out)
    }
}

/// Hash the concatenation of `parts` with blake3.
pub fn sum(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    Hash32(*hasher.finalize().as_bytes())
}

/// Derive the address an account spawned from `template` with the given
/// SCALE-encoded arguments will receive.
pub fn compute_principal(template: &Address, encoded_args: &[u8]) -> Address {
    Address::from_digest(&sum(&[template.as_ref(), encoded_args]))
}
