//! Static network parameters fetched once per collector session.

use serde::{Deserialize, Serialize};

/// Network-wide constants reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Genesis id / network id (`0x…`).
    pub net_id: String,
    /// Unix timestamp (seconds) of layer 0.
    pub genesis_time: i64,
    /// Number of layers per epoch.
    pub epoch_num_layers: u32,
    /// Maximum transactions per second the network accepts.
    pub max_tx_per_second: u32,
    /// Duration of one layer in seconds.
    pub layer_duration: u64,
}

impl NetworkInfo {
    /// Layer containing the unix timestamp `ts`.
    ///
    /// Timestamps before genesis map to layer 0.
    pub fn layer_at(&self, ts: i64) -> u32 {
        if self.layer_duration == 0 || ts <= self.genesis_time {
            return 0;
        }
        let elapsed = (ts - self.genesis_time) as u64;
        u32::try_from(elapsed / self.layer_duration).unwrap_or(u32::MAX)
    }

    /// Epoch the given layer belongs to.
    pub fn epoch_of(&self, layer: u32) -> u32 {
        if self.epoch_num_layers == 0 {
            return 0;
        }
        layer / self.epoch_num_layers
    }

    /// First layer of `epoch`.
    pub fn first_layer(&self, epoch: u32) -> u32 {
        epoch.saturating_mul(self.epoch_num_layers)
    }

    /// Last layer of `epoch` (inclusive).
    pub fn last_layer(&self, epoch: u32) -> u32 {
        self.first_layer(epoch)
            .saturating_add(self.epoch_num_layers.saturating_sub(1))
    }

    /// Genesis time as a UTC datetime, for display.
    pub fn genesis_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.genesis_time, 0)
    }
}
