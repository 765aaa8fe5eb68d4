//! Out-of-band re-ingestion, triggered through the admin surface.
//!
//! Every operation returns immediately with a [`JoinHandle`]; the work runs
//! on its own short-lived connection and delivers through the same
//! [`Listener`] as the live collector.

use std::sync::Arc;

use meshindex_core::Listener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::CollectorError;
use crate::stream::{NodeConnection, NodeConnector};

/// Handle returned by every resync operation: number of layers delivered.
pub type ResyncHandle = JoinHandle<Result<usize, CollectorError>>;

#[derive(Clone)]
pub struct Resync {
    connector: Arc<dyn NodeConnector>,
    listener: Arc<dyn Listener>,
    batch_size: u32,
}

impl Resync {
    pub fn new(
        connector: Arc<dyn NodeConnector>,
        listener: Arc<dyn Listener>,
        batch_size: u32,
    ) -> Self {
        Self {
            connector,
            listener,
            batch_size: batch_size.max(1),
        }
    }

    /// Re-ingest a single layer.
    pub fn sync_layer(&self, layer: u32) -> ResyncHandle {
        self.spawn("layer", move |conn, this| async move {
            this.ingest(conn.as_ref(), layer, layer).await
        })
    }

    /// Re-ingest every layer of `epoch`.
    pub fn sync_epoch(&self, epoch: u32) -> ResyncHandle {
        self.spawn("epoch", move |conn, this| async move {
            let info = conn.network_info().await?;
            if info.epoch_num_layers == 0 {
                return Ok(0);
            }
            this.ingest(conn.as_ref(), info.first_layer(epoch), info.last_layer(epoch))
                .await
        })
    }

    /// Re-ingest from the layer containing unix time `ts` up to the node's
    /// current top layer.
    pub fn sync_from_time(&self, ts: i64) -> ResyncHandle {
        self.spawn("from_time", move |conn, this| async move {
            let info = conn.network_info().await?;
            let status = conn.node_status().await?;
            let from = info.layer_at(ts);
            if from > status.top_layer {
                return Ok(0);
            }
            this.ingest(conn.as_ref(), from, status.top_layer).await
        })
    }

    /// Ask the listener to recompute statistics for `epoch`.
    pub fn recalculate_epoch_stats(&self, epoch: u32) -> JoinHandle<Result<(), CollectorError>> {
        let listener = Arc::clone(&self.listener);
        tokio::spawn(async move {
            let result = listener
                .recalculate_epoch_stats(epoch)
                .await
                .map_err(CollectorError::from);
            match &result {
                Ok(()) => info!(epoch, "epoch stats recalculated"),
                Err(e) => warn!(epoch, error = %e, "epoch stats recalculation failed"),
            }
            result
        })
    }

    fn spawn<F, Fut>(&self, op: &'static str, work: F) -> ResyncHandle
    where
        F: FnOnce(Arc<dyn NodeConnection>, Resync) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<usize, CollectorError>> + Send + 'static,
    {
        let this = self.clone();
        tokio::spawn(async move {
            let result = match this.connector.connect().await {
                Ok(conn) => {
                    let result = work(Arc::clone(&conn), this).await;
                    conn.close().await;
                    result
                }
                Err(e) => Err(e),
            };
            match &result {
                Ok(layers) => info!(op, layers, "resync finished"),
                Err(e) => warn!(op, error = %e, "resync failed"),
            }
            result
        })
    }

    /// Fetch `from..=to` in batches and hand every layer to the listener.
    async fn ingest(
        &self,
        conn: &dyn NodeConnection,
        from: u32,
        to: u32,
    ) -> Result<usize, CollectorError> {
        let mut delivered = 0usize;
        let mut start = from;
        while start <= to {
            let end = start.saturating_add(self.batch_size - 1).min(to);
            for layer in conn.layers(start, end).await? {
                self.listener.on_layer(&layer).await?;
                delivered += 1;
            }
            if end == u32::MAX {
                break;
            }
            start = end + 1;
        }
        Ok(delivered)
    }
}
