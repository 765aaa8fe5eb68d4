//! Logging setup for the `meshindex` binary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// `log` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base level for everything without an override.
    pub level: String,
    /// Crate name → level, e.g. `"meshindex-collector": "debug"`.
    pub components: BTreeMap<String, String>,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            components: BTreeMap::new(),
            format: LogFormat::Text,
        }
    }
}

impl LogConfig {
    /// Builds the `EnvFilter` directive string. `RUST_LOG` wins over the
    /// configured base level; component overrides are always appended.
    pub fn directives(&self) -> String {
        let base = std::env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        std::iter::once(base)
            .chain(
                self.components
                    .iter()
                    .map(|(krate, level)| format!("{}={level}", krate.replace('-', "_"))),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filter(&self) -> EnvFilter {
        match EnvFilter::try_new(self.directives()) {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!("invalid log filter {:?} ({e}); falling back to info", self.directives());
                EnvFilter::new("info")
            }
        }
    }
}

/// Install the global subscriber. Must run once, before the first log line.
pub fn init_tracing(config: &LogConfig) {
    let registry = tracing_subscriber::registry().with(config.filter());
    match config.format {
        LogFormat::Json => registry.with(fmt::layer().json().with_current_span(false)).init(),
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
    }
}
