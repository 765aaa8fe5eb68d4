//! # meshindex-collector
//!
//! Keeps a live feed of node events flowing into a [`meshindex_core::Listener`].
//!
//! A [`Collector`] holds one connection to the node and runs four stream
//! pumps over it (sync status, mesh layers, global state, node errors). The
//! pumps form a single session: it is online only while all four are up,
//! and the loss of any one tears the session down and starts a new
//! generation after the configured [`ReconnectPolicy`] delay.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use meshindex_collector::{Collector, CollectorBuilder, WsNodeConnector};
//! # async fn example(listener: Arc<dyn meshindex_core::Listener>) {
//! let config = CollectorBuilder::new().node_url("ws://127.0.0.1:9093").build_config();
//! let connector = Arc::new(WsNodeConnector::from_config(&config));
//! let collector = Collector::new(config, connector, listener);
//! collector.run().await;
//! # }
//! ```
//!
//! [`Resync`] serves out-of-band re-ingestion requests over separate
//! connections.

pub mod collector;
pub mod config;
pub mod error;
pub mod message;
mod pump;
pub mod resync;
pub mod session;
pub mod stream;
pub mod ws;

pub use collector::{Collector, CollectorMetrics};
pub use config::{CollectorBuilder, CollectorConfig, ReconnectPolicy};
pub use error::CollectorError;
pub use message::{GlobalStateItem, NodeErrorLevel, NodeErrorMessage};
pub use resync::{Resync, ResyncHandle};
pub use session::{Notification, Phase, Session, Transition};
pub use stream::{NodeConnection, NodeConnector, NodeStream, StreamKind};
pub use ws::{WsConnection, WsNodeConnector};
