//! Payloads carried by the global-state and node-error subscriptions.
//!
//! The status and layer subscriptions carry [`meshindex_core::NodeStatus`]
//! and [`meshindex_core::Layer`] directly.

use meshindex_core::{Account, Reward, TransactionReceipt};
use serde::{Deserialize, Serialize};

/// One item of the global-state subscription.
///
/// Externally tagged on the wire: `{"account": {...}}`, `{"reward": {...}}`
/// or `{"receipt": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalStateItem {
    Account(Account),
    Reward(Reward),
    Receipt(TransactionReceipt),
}

/// Severity reported by the node for an error event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeErrorLevel {
    Debug,
    Info,
    Warn,
    #[default]
    Error,
    Dpanic,
    Panic,
    Fatal,
}

/// An error event emitted by the node itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeErrorMessage {
    #[serde(default)]
    pub level: NodeErrorLevel,
    #[serde(default)]
    pub module: String,
    pub message: String,
    #[serde(default)]
    pub stack_trace: String,
}

impl NodeErrorMessage {
    /// Emit this node error as a local log line at the matching level.
    pub fn log(&self) {
        let (module, msg) = (self.module.as_str(), self.message.as_str());
        match self.level {
            NodeErrorLevel::Debug => tracing::debug!(module, "node: {msg}"),
            NodeErrorLevel::Info => tracing::info!(module, "node: {msg}"),
            NodeErrorLevel::Warn => tracing::warn!(module, "node: {msg}"),
            NodeErrorLevel::Error => tracing::error!(module, "node: {msg}"),
            NodeErrorLevel::Dpanic | NodeErrorLevel::Panic | NodeErrorLevel::Fatal => {
                tracing::error!(
                    module,
                    level = ?self.level,
                    stack_trace = %self.stack_trace,
                    "node: {msg}"
                )
            }
        }
    }
}
