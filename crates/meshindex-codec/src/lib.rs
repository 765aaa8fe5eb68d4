//! # meshindex-codec
//!
//! Pure decoder for stored ledger transactions. Given the raw bytes of a
//! transaction it reconstructs a [`DecodedTransaction`] whose `contents`
//! is a closed [`TxContents`] enum, or returns a classified [`DecodeError`].
//!
//! The decoder does no I/O and keeps no mutable state; concurrent calls
//! need no synchronization.
//!
//! ```
//! use meshindex_codec::{decode, DecodeError};
//!
//! // Version 1 is not defined.
//! assert_eq!(decode(&[0x04]), Err(DecodeError::UnsupportedVersion { version: 1 }));
//! ```

pub mod address;
pub mod error;
pub mod scale;
pub mod template;
pub mod transaction;

pub use address::{compute_principal, Address, Hash32, PublicKey};
pub use error::DecodeError;
pub use template::{Method, Template};
pub use transaction::{decode, decode_batch, DecodedTransaction, TxContents};
