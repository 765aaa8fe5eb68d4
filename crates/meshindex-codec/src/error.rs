//! Error types for the transaction decoder.

use thiserror::Error;

use crate::address::Address;

/// Errors that can occur while decoding a single transaction.
///
/// Decoding never panics on malformed input; every failure is reported
/// through one of these variants so batch callers can skip and continue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Unsupported transaction version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("Malformed transaction at field '{field}': {reason}")]
    Malformed { field: &'static str, reason: String },

    #[error("Unknown method selector {method}")]
    UnknownMethod { method: u8 },

    #[error("Unknown template {template} for method {method}")]
    UnknownTemplate { template: Address, method: u8 },
}

impl DecodeError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn truncated(field: &'static str, needed: usize, remaining: usize) -> Self {
        Self::malformed(
            field,
            format!("needs {needed} more bytes, {remaining} remaining"),
        )
    }

    /// Returns the failing field for [`DecodeError::Malformed`] errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Malformed { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Returns `true` for errors caused by a truncated or garbled buffer.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}
