//! The `Listener` contract between the collector and the storage layer.

use async_trait::async_trait;

use crate::error::ListenerError;
use crate::network::NetworkInfo;
use crate::types::{Account, Layer, NodeStatus, Reward, TransactionReceipt};

/// Consumer of decoded chain events.
///
/// Every method is awaited by the pump that produced the event before the
/// pump reads its next message, so a slow implementation throttles the
/// stream. Within one stream events arrive in node order; across streams
/// there is no ordering guarantee, so implementations should reconcile on
/// the layer numbers carried by each event.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Called once per session, before any stream is opened.
    async fn on_network_info(&self, info: &NetworkInfo) -> Result<(), ListenerError>;

    async fn on_node_status(&self, status: &NodeStatus) -> Result<(), ListenerError>;

    async fn on_layer(&self, layer: &Layer) -> Result<(), ListenerError>;

    async fn on_account(&self, account: &Account) -> Result<(), ListenerError>;

    async fn on_reward(&self, reward: &Reward) -> Result<(), ListenerError>;

    async fn on_transaction_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> Result<(), ListenerError>;

    /// Recompute derived statistics for `epoch`.
    ///
    /// Triggered out-of-band through the admin surface. The default does
    /// nothing.
    async fn recalculate_epoch_stats(&self, _epoch: u32) -> Result<(), ListenerError> {
        Ok(())
    }
}
