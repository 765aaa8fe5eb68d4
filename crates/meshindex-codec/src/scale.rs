//! Field-aware SCALE reader for the transaction wire format.
//!
//! The byte-level work is done by `parity-scale-codec`; this wrapper only
//! attaches the name of the field being read to every failure, so a
//! truncated or garbled buffer reports where it broke.
//!
//! Compact integers must be canonical (shortest form) and fit the target
//! width. The codec rejects anything else.

use parity_scale_codec::{Compact, Decode};

use crate::address::PublicKey;
use crate::error::DecodeError;

/// Sequential reader over a borrowed buffer. Never backtracks.
pub struct ScaleReader<'a> {
    input: &'a [u8],
}

impl<'a> ScaleReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { input: buf }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.input.len()
    }

    /// Decode one value of `T` for `field`.
    pub fn read<T: Decode>(&mut self, field: &'static str) -> Result<T, DecodeError> {
        T::decode(&mut self.input).map_err(|e| DecodeError::malformed(field, e.to_string()))
    }

    /// Decode a compact-encoded integer of width `T`.
    pub fn read_compact<T>(&mut self, field: &'static str) -> Result<T, DecodeError>
    where
        Compact<T>: Decode,
    {
        self.read::<Compact<T>>(field).map(|c| c.0)
    }

    /// Read a compact length prefix followed by at most `limit` public keys.
    ///
    /// The prefix is checked before any key is read, so a hostile length
    /// never drives allocation.
    pub fn read_public_keys(
        &mut self,
        field: &'static str,
        limit: usize,
    ) -> Result<Vec<PublicKey>, DecodeError> {
        let len = self.read_compact::<u32>(field)?;
        if len as usize > limit {
            return Err(DecodeError::malformed(
                field,
                format!("list of {len} items exceeds limit {limit}"),
            ));
        }
        (0..len).map(|_| self.read::<PublicKey>(field)).collect()
    }

    /// Consume exactly `len` raw bytes.
    pub fn read_bytes(&mut self, field: &'static str, len: usize) -> Result<&'a [u8], DecodeError> {
        if self.input.len() < len {
            return Err(DecodeError::truncated(field, len, self.input.len()));
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }
}
