//! Error types returned by listener implementations.

use thiserror::Error;

/// Errors a [`crate::Listener`] may return while consuming an event.
///
/// The collector treats any of these as a failure of the stream that
/// delivered the event.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Rejected {event} event: {reason}")]
    Rejected { event: String, reason: String },

    #[error("{0}")]
    Other(String),
}

impl ListenerError {
    /// Shorthand for a [`ListenerError::Rejected`] error.
    pub fn rejected(event: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            event: event.into(),
            reason: reason.into(),
        }
    }
}
