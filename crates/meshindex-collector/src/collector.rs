//! The collector: one supervised session of four streams against a node.
//!
//! Each session generation runs:
//!
//! ```text
//! connect ─► network_info ─► Listener::on_network_info
//!         ─► spawn 4 pumps ─► PartiallyUp ─► Online (all Up)
//!         ─► any Down ─► Draining: close connection
//!         ─► every pump exited ─► Disconnected ─► sleep(backoff) ─► next generation
//! ```
//!
//! Any failure tears the whole generation down; the session never runs with
//! a subset of its streams.

use std::sync::{Arc, Mutex};

use meshindex_core::Listener;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::pump::run_pump;
use crate::session::{Phase, Session, Transition};
use crate::stream::{NodeConnector, StreamKind};

/// Counter snapshot for a collector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectorMetrics {
    /// Generations that got past connect and network parameters.
    pub sessions_started: u64,
    /// Generations in which all four streams came up.
    pub sessions_online: u64,
    /// Failed connect attempts (including network parameter fetches).
    pub connect_failures: u64,
    /// Generations torn down by a stream failure.
    pub stream_failures: u64,
    /// Messages handed to the listener.
    pub messages_delivered: u64,
}

pub(crate) type SharedMetrics = Arc<Mutex<CollectorMetrics>>;

/// Supervises the node connection and its stream pumps.
pub struct Collector {
    config: CollectorConfig,
    connector: Arc<dyn NodeConnector>,
    listener: Arc<dyn Listener>,
    metrics: SharedMetrics,
    phase: watch::Sender<Phase>,
}

impl Collector {
    pub fn new(
        config: CollectorConfig,
        connector: Arc<dyn NodeConnector>,
        listener: Arc<dyn Listener>,
    ) -> Self {
        let (phase, _) = watch::channel(Phase::Disconnected);
        Self {
            config,
            connector,
            listener,
            metrics: Arc::new(Mutex::new(CollectorMetrics::default())),
            phase,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Watch the session phase.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Returns a snapshot of current metrics.
    pub fn metrics(&self) -> CollectorMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn bump(&self, f: impl FnOnce(&mut CollectorMetrics)) {
        f(&mut self.metrics.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
    }

    fn set_phase(&self, phase: Phase) {
        debug!(%phase, "session phase");
        self.phase.send_replace(phase);
    }

    /// Run session generations forever.
    ///
    /// Connect and stream failures are logged and retried after the
    /// configured backoff; this future only completes when dropped.
    pub async fn run(&self) {
        info!(node = %self.connector.endpoint(), "collector starting");
        let mut failures = 0u32;
        loop {
            match self.run_generation().await {
                Ok(true) => failures = 0,
                Ok(false) => failures = failures.saturating_add(1),
                Err(e) => {
                    warn!(node = %self.connector.endpoint(), error = %e, "connect failed");
                    self.bump(|m| m.connect_failures += 1);
                    self.set_phase(Phase::Disconnected);
                    failures = failures.saturating_add(1);
                }
            }
            let delay = self.config.reconnect.delay(failures.saturating_sub(1));
            debug!(?delay, "waiting before next session");
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one session generation until every pump has exited.
    ///
    /// Returns whether the session reached [`Phase::Online`]. An `Err` means
    /// the connection or the network parameters could not be obtained and no
    /// pump was started.
    pub async fn run_generation(&self) -> Result<bool, CollectorError> {
        let mut session = Session::new();
        session.begin_connect();
        self.set_phase(session.phase());

        let conn = self.connector.connect().await?;
        let info = match conn.network_info().await {
            Ok(info) => info,
            Err(e) => {
                conn.close().await;
                return Err(e);
            }
        };
        if let Err(e) = self.listener.on_network_info(&info).await {
            conn.close().await;
            return Err(e.into());
        }
        info!(net_id = %info.net_id, genesis = info.genesis_time, "connected");
        self.bump(|m| m.sessions_started += 1);

        let (tx, mut rx) = mpsc::unbounded_channel();
        for kind in StreamKind::ALL {
            tokio::spawn(run_pump(
                kind,
                Arc::clone(&conn),
                Arc::clone(&self.listener),
                tx.clone(),
                Arc::clone(&self.metrics),
            ));
        }
        // The channel closes once the last pump is gone.
        drop(tx);
        session.pumps_started();
        self.set_phase(session.phase());

        let mut reached_online = false;
        while let Some(notification) = rx.recv().await {
            debug!(?notification, active = session.active_count(), "pump notification");
            match session.apply(notification) {
                Transition::Online => {
                    info!("all streams up, session online");
                    reached_online = true;
                    self.bump(|m| m.sessions_online += 1);
                    self.set_phase(session.phase());
                }
                Transition::Drain => {
                    warn!(?notification, "stream lost, draining session");
                    self.bump(|m| m.stream_failures += 1);
                    self.set_phase(session.phase());
                    conn.close().await;
                }
                Transition::None => {}
            }
        }

        session.finish();
        self.set_phase(session.phase());
        info!("session ended");
        Ok(reached_online)
    }
}
