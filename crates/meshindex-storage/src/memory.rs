//! In-memory storage backend.
//!
//! Keeps the latest view of layers, accounts, rewards and receipts in RAM.
//! Useful for testing and for running the collector without a database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meshindex_core::{
    Account, Layer, Listener, ListenerError, NetworkInfo, NodeStatus, Reward, TransactionReceipt,
};
use serde::Serialize;
use tracing::debug;

/// Aggregates for one epoch, computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpochStats {
    pub epoch: u32,
    /// Layers of the epoch that have been stored.
    pub layers: u32,
    pub activations: u64,
    /// Distinct smeshers that published an activation in the epoch.
    pub smeshers: u64,
    pub rewards_total: u64,
    pub computed_at: DateTime<Utc>,
}

/// In-memory [`Listener`].
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct InMemoryStorage {
    network_info: Mutex<Option<NetworkInfo>>,
    node_status: Mutex<Option<NodeStatus>>,
    layers: Mutex<BTreeMap<u32, Layer>>,
    accounts: Mutex<HashMap<String, Account>>,
    /// Keyed by (layer, smesher) so replays do not double count.
    rewards: Mutex<HashMap<(u32, String), Reward>>,
    receipts: Mutex<HashMap<String, TransactionReceipt>>,
    epoch_stats: Mutex<BTreeMap<u32, EpochStats>>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn network_info(&self) -> Option<NetworkInfo> {
        guard(&self.network_info).clone()
    }

    /// Most recent node status.
    pub fn node_status(&self) -> Option<NodeStatus> {
        *guard(&self.node_status)
    }

    pub fn layer(&self, number: u32) -> Option<Layer> {
        guard(&self.layers).get(&number).cloned()
    }

    /// Highest stored layer number.
    pub fn last_layer(&self) -> Option<u32> {
        guard(&self.layers).keys().next_back().copied()
    }

    pub fn layer_count(&self) -> usize {
        guard(&self.layers).len()
    }

    pub fn account(&self, address: &str) -> Option<Account> {
        guard(&self.accounts).get(address).cloned()
    }

    /// Rewards paid to `coinbase`, in layer order.
    pub fn rewards_for(&self, coinbase: &str) -> Vec<Reward> {
        let mut out: Vec<Reward> = guard(&self.rewards)
            .values()
            .filter(|r| r.coinbase == coinbase)
            .cloned()
            .collect();
        out.sort_by_key(|r| r.layer);
        out
    }

    pub fn receipt(&self, id: &str) -> Option<TransactionReceipt> {
        guard(&self.receipts).get(id).cloned()
    }

    /// Last computed statistics for `epoch`.
    pub fn epoch_stats(&self, epoch: u32) -> Option<EpochStats> {
        guard(&self.epoch_stats).get(&epoch).cloned()
    }

    fn compute_epoch_stats(&self, epoch: u32) -> Result<EpochStats, ListenerError> {
        let info = self
            .network_info()
            .ok_or_else(|| ListenerError::Other("network parameters not received yet".into()))?;
        let (first, last) = (info.first_layer(epoch), info.last_layer(epoch));

        let mut stats = EpochStats {
            epoch,
            layers: 0,
            activations: 0,
            smeshers: 0,
            rewards_total: 0,
            computed_at: Utc::now(),
        };
        let mut smeshers = HashSet::new();
        for layer in guard(&self.layers).range(first..=last).map(|(_, l)| l) {
            stats.layers += 1;
            stats.activations += layer.activations.len() as u64;
            smeshers.extend(layer.activations.iter().map(|a| a.smesher_id.as_str().to_owned()));
        }
        stats.smeshers = smeshers.len() as u64;
        stats.rewards_total = guard(&self.rewards)
            .values()
            .filter(|r| r.layer >= first && r.layer <= last)
            .map(|r| r.total)
            .fold(0u64, u64::saturating_add);
        Ok(stats)
    }
}

#[async_trait]
impl Listener for InMemoryStorage {
    async fn on_network_info(&self, info: &NetworkInfo) -> Result<(), ListenerError> {
        let mut current = guard(&self.network_info);
        if let Some(prev) = current.as_ref() {
            if prev.net_id != info.net_id {
                return Err(ListenerError::rejected(
                    "network_info",
                    format!("node switched networks from {} to {}", prev.net_id, info.net_id),
                ));
            }
        }
        *current = Some(info.clone());
        Ok(())
    }

    async fn on_node_status(&self, status: &NodeStatus) -> Result<(), ListenerError> {
        *guard(&self.node_status) = Some(*status);
        Ok(())
    }

    async fn on_layer(&self, layer: &Layer) -> Result<(), ListenerError> {
        debug!(layer = layer.number, status = %layer.status, "store layer");
        guard(&self.layers).insert(layer.number, layer.clone());
        Ok(())
    }

    async fn on_account(&self, account: &Account) -> Result<(), ListenerError> {
        let mut accounts = guard(&self.accounts);
        match accounts.get(&account.address) {
            // never regress to an older observation
            Some(known) if known.layer > account.layer => {}
            _ => {
                accounts.insert(account.address.clone(), account.clone());
            }
        }
        Ok(())
    }

    async fn on_reward(&self, reward: &Reward) -> Result<(), ListenerError> {
        guard(&self.rewards).insert((reward.layer, reward.smesher_id.clone()), reward.clone());
        Ok(())
    }

    async fn on_transaction_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> Result<(), ListenerError> {
        guard(&self.receipts).insert(receipt.id.clone(), receipt.clone());
        Ok(())
    }

    async fn recalculate_epoch_stats(&self, epoch: u32) -> Result<(), ListenerError> {
        let stats = self.compute_epoch_stats(epoch)?;
        debug!(epoch, layers = stats.layers, activations = stats.activations, "epoch stats");
        guard(&self.epoch_stats).insert(epoch, stats);
        Ok(())
    }
}
