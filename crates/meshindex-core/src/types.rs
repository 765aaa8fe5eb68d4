//! Domain events produced by the collector's stream pumps.
//!
//! All structs deserialize straight from the node's wire messages and are
//! handed to the [`crate::Listener`] without buffering.

use serde::{Deserialize, Serialize};

// ─── Layer ────────────────────────────────────────────────────────────────────

/// Consensus status of a mesh layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    #[default]
    Unspecified,
    /// Hare output reached, not yet confirmed.
    Approved,
    /// Confirmed by tortoise.
    Confirmed,
    /// State applied.
    Applied,
}

impl std::fmt::Display for LayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unspecified => write!(f, "unspecified"),
            Self::Approved => write!(f, "approved"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Applied => write!(f, "applied"),
        }
    }
}

/// A block inside a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block id (`0x…`).
    pub id: String,
    /// Layer the block belongs to.
    pub layer: u32,
    /// Ids of the transactions included in the block.
    #[serde(default)]
    pub tx_ids: Vec<String>,
}

/// An activation (ATX) published by a smesher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activation {
    /// ATX id (`0x…`).
    pub id: String,
    /// Layer in which the activation was published.
    pub layer: u32,
    /// Node identity of the smesher.
    pub smesher_id: String,
    /// Address receiving the smesher's rewards.
    pub coinbase: String,
    /// Space units committed.
    pub num_units: u32,
}

/// A confirmed mesh layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub number: u32,
    #[serde(default)]
    pub status: LayerStatus,
    /// Aggregated layer hash, empty if the node did not report one.
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub activations: Vec<Activation>,
}

// ─── Global state ─────────────────────────────────────────────────────────────

/// Account state after a layer was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub balance: u64,
    /// Next nonce expected from this account.
    pub counter: u64,
    /// Layer at which this state was observed.
    #[serde(default)]
    pub layer: u32,
}

/// A reward paid to a coinbase for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub layer: u32,
    pub coinbase: String,
    pub smesher_id: String,
    /// Layer reward plus collected fees.
    pub total: u64,
    pub layer_reward: u64,
}

/// Outcome of a transaction's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionResult {
    #[default]
    Unspecified,
    Success,
    Failure,
    Invalid,
}

/// Execution receipt for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub id: String,
    #[serde(default)]
    pub result: TransactionResult,
    pub gas_used: u64,
    pub fee: u64,
    #[serde(default)]
    pub layer: u32,
}

// ─── Node status ──────────────────────────────────────────────────────────────

/// Sync status reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeStatus {
    pub connected_peers: u64,
    pub is_synced: bool,
    pub synced_layer: u32,
    pub top_layer: u32,
    pub verified_layer: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_deserializes_with_defaults() {
        let layer: Layer = serde_json::from_str(r#"{"number": 42}"#).unwrap();
        assert_eq!(layer.number, 42);
        assert_eq!(layer.status, LayerStatus::Unspecified);
        assert!(layer.blocks.is_empty());
        assert!(layer.activations.is_empty());
    }

    #[test]
    fn layer_status_wire_names() {
        let layer: Layer =
            serde_json::from_str(r#"{"number": 7, "status": "confirmed"}"#).unwrap();
        assert_eq!(layer.status, LayerStatus::Confirmed);
        assert_eq!(layer.status.to_string(), "confirmed");
    }

    #[test]
    fn receipt_result_defaults_to_unspecified() {
        let r: TransactionReceipt =
            serde_json::from_str(r#"{"id":"0x01","gas_used":10,"fee":20}"#).unwrap();
        assert_eq!(r.result, TransactionResult::Unspecified);
        assert_eq!(r.fee, 20);
    }

    #[test]
    fn reward_requires_all_fields() {
        let res: Result<Reward, _> = serde_json::from_str(r#"{"layer":1,"coinbase":"sm1"}"#);
        assert!(res.is_err());
    }
}
