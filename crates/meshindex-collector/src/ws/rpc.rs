//! JSON-RPC 2.0 framing for the node WebSocket API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CollectorError;

pub const GENESIS_TIME: &str = "mesh_genesisTime";
pub const GENESIS_ID: &str = "mesh_genesisId";
pub const EPOCH_NUM_LAYERS: &str = "mesh_epochNumLayers";
pub const MAX_TX_PER_SECOND: &str = "mesh_maxTransactionsPerSecond";
pub const LAYER_DURATION: &str = "mesh_layerDuration";
pub const NODE_STATUS: &str = "node_status";
pub const SYNC_START: &str = "node_syncStart";
pub const LAYERS_QUERY: &str = "mesh_layersQuery";
pub const SUBSCRIBE: &str = "meshindex_subscribe";
/// Method name carried by subscription notifications.
pub const SUBSCRIPTION: &str = "meshindex_subscription";

/// An outgoing request.
#[derive(Debug, Serialize)]
pub struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

impl<'a> Request<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }

    pub fn to_text(&self) -> Result<String, CollectorError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<ErrorObject> for CollectorError {
    fn from(e: ErrorObject) -> Self {
        CollectorError::Rpc {
            code: e.code,
            message: e.message,
        }
    }
}

/// A classified incoming frame.
#[derive(Debug)]
pub enum Incoming {
    /// Reply to the request with this id.
    Response {
        id: u64,
        result: Result<Value, CollectorError>,
    },
    /// A message pushed on an established subscription.
    Notification { subscription: String, result: Value },
    /// Anything else; ignored by the client.
    Unknown,
}

/// Subscription ids may be strings or numbers on the wire.
pub fn subscription_key(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn classify(text: &str) -> Incoming {
    let Ok(mut frame) = serde_json::from_str::<Value>(text) else {
        return Incoming::Unknown;
    };

    if frame.get("method").and_then(Value::as_str) == Some(SUBSCRIPTION) {
        let params = frame["params"].take();
        return match subscription_key(&params["subscription"]) {
            Some(subscription) => Incoming::Notification {
                subscription,
                result: params.get("result").cloned().unwrap_or(Value::Null),
            },
            None => Incoming::Unknown,
        };
    }

    let Some(id) = frame.get("id").and_then(Value::as_u64) else {
        return Incoming::Unknown;
    };
    let error = frame.get_mut("error").map(Value::take);
    let result = match error {
        Some(err) if !err.is_null() => match serde_json::from_value::<ErrorObject>(err) {
            Ok(obj) => Err(obj.into()),
            Err(e) => Err(e.into()),
        },
        _ => Ok(frame.get_mut("result").map(Value::take).unwrap_or(Value::Null)),
    };
    Incoming::Response { id, result }
}
