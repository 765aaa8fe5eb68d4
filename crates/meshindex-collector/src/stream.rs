//! Node transport abstraction.
//!
//! The collector only ever talks to a node through these two traits, so the
//! supervisor logic is independent of the wire protocol. The production
//! implementation lives in [`crate::ws`].

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use meshindex_core::{Layer, NetworkInfo, NodeStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CollectorError;

/// One of the four server-streaming subscriptions of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    SyncStatus,
    MeshLayer,
    GlobalState,
    NodeError,
}

impl StreamKind {
    pub const ALL: [StreamKind; 4] = [
        StreamKind::SyncStatus,
        StreamKind::MeshLayer,
        StreamKind::GlobalState,
        StreamKind::NodeError,
    ];

    /// Position in [`StreamKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            Self::SyncStatus => 0,
            Self::MeshLayer => 1,
            Self::GlobalState => 2,
            Self::NodeError => 3,
        }
    }

    /// Name used on the wire when subscribing.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SyncStatus => "sync_status",
            Self::MeshLayer => "mesh_layer",
            Self::GlobalState => "global_state",
            Self::NodeError => "node_error",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw messages of one subscription, in node order.
///
/// The stream ends when the node completes the subscription or the
/// connection is closed.
pub type NodeStream = Pin<Box<dyn Stream<Item = Result<Value, CollectorError>> + Send>>;

/// Opens connections to a node.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn NodeConnection>, CollectorError>;

    /// Endpoint description, for logs.
    fn endpoint(&self) -> &str;
}

/// A single open connection to a node.
///
/// Closing a connection must end every stream obtained from it and fail
/// every request still in flight; the collector relies on this to stop its
/// pumps.
#[async_trait]
pub trait NodeConnection: Send + Sync {
    /// Fetch the static network parameters.
    async fn network_info(&self) -> Result<NetworkInfo, CollectorError>;

    async fn node_status(&self) -> Result<NodeStatus, CollectorError>;

    /// Ask the node to start (or resume) syncing.
    async fn sync_start(&self) -> Result<(), CollectorError>;

    /// Layers `from..=to`.
    async fn layers(&self, from: u32, to: u32) -> Result<Vec<Layer>, CollectorError>;

    async fn subscribe(&self, kind: StreamKind) -> Result<NodeStream, CollectorError>;

    async fn close(&self);
}
