//! JSON-RPC over WebSocket node transport.

pub mod client;
pub mod rpc;
pub mod subscriptions;

pub use client::{WsConnection, WsNodeConnector};
