//! Optional JSON configuration file for `meshindex collect`.
//!
//! ```json
//! {
//!   "node_url": "ws://10.0.0.5:9093",
//!   "reconnect": { "initial_ms": 1000, "max_ms": 30000, "multiplier": 2.0 },
//!   "listen": "0.0.0.0:5000",
//!   "log": { "level": "info", "format": "json", "components": { "meshindex-collector": "debug" } }
//! }
//! ```
//!
//! Command-line flags override values from the file.

use std::path::Path;

use anyhow::{Context, Result};
use meshindex_collector::CollectorConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(flatten)]
    pub collector: CollectorConfig,
    /// Admin HTTP listen address.
    #[serde(default)]
    pub listen: Option<String>,
    #[serde(default)]
    pub log: LogConfig,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn listen(&self) -> &str {
        self.listen.as_deref().unwrap_or(DEFAULT_LISTEN)
    }
}
