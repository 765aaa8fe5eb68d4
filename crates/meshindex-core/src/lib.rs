//! meshindex-core: foundation types for the MeshIndex ingestion engine.
//!
//! # Architecture
//!
//! ```text
//! Collector (meshindex-collector)
//!     ├── StreamPump × 4  ──► Listener (this crate, implemented by storage)
//!     └── NetworkInfo     ──► Listener::on_network_info
//!
//! Read path ──► meshindex-codec::decode (independent of the collector)
//! ```
//!
//! Everything a storage layer needs to consume the live feed lives here:
//! the domain event structs, the [`Listener`] contract and the
//! [`NetworkInfo`] parameters with their layer/epoch arithmetic.

pub mod error;
pub mod listener;
pub mod network;
pub mod types;

pub use error::ListenerError;
pub use listener::Listener;
pub use network::NetworkInfo;
pub use types::{
    Account, Activation, Block, Layer, LayerStatus, NodeStatus, Reward, TransactionReceipt,
    TransactionResult,
};
