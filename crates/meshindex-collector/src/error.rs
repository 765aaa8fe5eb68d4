//! Collector and node-transport error types.

use meshindex_core::ListenerError;
use thiserror::Error;

/// Errors raised while talking to the node or delivering its events.
///
/// None of these are fatal to the collector: every variant ends the current
/// session generation and triggers a reconnect.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Could not open the connection or fetch the network parameters.
    #[error("Connect error: {0}")]
    Connect(String),

    /// A subscription failed or delivered something unusable.
    #[error("Stream error: {0}")]
    Stream(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Node payload did not match the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The listener refused an event.
    #[error("Listener error: {0}")]
    Listener(#[from] ListenerError),

    /// Request was not answered in time.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// The connection is closed; no further requests can be made on it.
    #[error("Connection closed")]
    Closed,
}

impl CollectorError {
    /// Returns `true` for failures of the transport itself, as opposed to
    /// bad payloads or listener rejections.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::Stream(_) | Self::Timeout { .. } | Self::Closed
        )
    }
}
