//! Collector configuration and its fluent builder.
//!
//! # Example
//!
//! ```rust
//! use meshindex_collector::{CollectorBuilder, ReconnectPolicy};
//!
//! let config = CollectorBuilder::new()
//!     .node_url("ws://10.0.0.5:9093")
//!     .reconnect(ReconnectPolicy::exponential(500, 30_000, 2.0))
//!     .resync_batch_size(50)
//!     .build_config();
//! assert_eq!(config.resync_batch_size, 50);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay between session generations.
///
/// The delay for the n-th consecutive failed generation is
/// `initial_ms * multiplier^n`, capped at `max_ms`. The default is a fixed
/// one second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    #[serde(default = "default_reconnect_ms")]
    pub initial_ms: u64,
    #[serde(default = "default_reconnect_ms")]
    pub max_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_reconnect_ms() -> u64 { 1_000 }
fn default_multiplier() -> f64 { 1.0 }

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(default_reconnect_ms())
    }
}

impl ReconnectPolicy {
    /// Same delay after every failure.
    pub fn fixed(ms: u64) -> Self {
        Self {
            initial_ms: ms,
            max_ms: ms,
            multiplier: 1.0,
        }
    }

    /// Growing delay, capped at `max_ms`.
    pub fn exponential(initial_ms: u64, max_ms: u64, multiplier: f64) -> Self {
        Self {
            initial_ms,
            max_ms: max_ms.max(initial_ms),
            multiplier,
        }
    }

    /// Delay before the next generation after `failures` consecutive failed
    /// generations (0-based).
    pub fn delay(&self, failures: u32) -> Duration {
        let multiplier = if self.multiplier.is_finite() && self.multiplier >= 1.0 {
            self.multiplier
        } else {
            1.0
        };
        let exp = failures.min(i32::MAX as u32) as i32;
        let ms = (self.initial_ms as f64 * multiplier.powi(exp)).min(self.max_ms as f64);
        Duration::from_millis(ms as u64)
    }
}

/// Runtime configuration of a collector and its resync service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Node JSON-RPC WebSocket endpoint, e.g. `ws://127.0.0.1:9093`.
    #[serde(default = "default_node_url")]
    pub node_url: String,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    /// Per-subscription queue depth between the socket reader and a pump.
    /// Once a queue is full the reader waits, which throttles the node.
    #[serde(default = "default_stream_buffer")]
    pub stream_buffer: usize,
    /// Timeout for request/response calls, including subscribe.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Layers requested per `mesh_layersQuery` call during resync.
    #[serde(default = "default_resync_batch_size")]
    pub resync_batch_size: u32,
}

fn default_node_url() -> String { "ws://127.0.0.1:9093".into() }
fn default_stream_buffer() -> usize { 64 }
fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_resync_batch_size() -> u32 { 100 }

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            reconnect: ReconnectPolicy::default(),
            stream_buffer: default_stream_buffer(),
            request_timeout_ms: default_request_timeout_ms(),
            resync_batch_size: default_resync_batch_size(),
        }
    }
}

impl CollectorConfig {
    /// Defaults pointed at `node_url`.
    pub fn for_node(node_url: impl Into<String>) -> Self {
        Self {
            node_url: node_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Fluent builder for [`CollectorConfig`].
#[derive(Default)]
pub struct CollectorBuilder {
    config: CollectorConfig,
}

impl CollectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration (e.g. loaded from a file).
    pub fn from_config(config: CollectorConfig) -> Self {
        Self { config }
    }

    pub fn node_url(mut self, url: impl Into<String>) -> Self {
        self.config.node_url = url.into();
        self
    }

    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.config.reconnect = policy;
        self
    }

    pub fn stream_buffer(mut self, size: usize) -> Self {
        self.config.stream_buffer = size.max(1);
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn resync_batch_size(mut self, size: u32) -> Self {
        self.config.resync_batch_size = size.max(1);
        self
    }

    pub fn build_config(self) -> CollectorConfig {
        self.config
    }
}
