//! Stream pumps: one task per subscription kind.
//!
//! A pump subscribes, reports `Up`, then feeds every message to the
//! listener until the stream ends or anything fails. Whatever the exit path,
//! its [`DownGuard`] reports `Down` exactly once.

use std::sync::Arc;

use futures::StreamExt;
use meshindex_core::{Layer, Listener, NodeStatus};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::collector::SharedMetrics;
use crate::error::CollectorError;
use crate::message::{GlobalStateItem, NodeErrorMessage};
use crate::session::Notification;
use crate::stream::{NodeConnection, StreamKind};

/// Sends `Down(kind)` when dropped, including during a panic unwind.
struct DownGuard {
    kind: StreamKind,
    tx: mpsc::UnboundedSender<Notification>,
}

impl Drop for DownGuard {
    fn drop(&mut self) {
        // The control task only goes away with the whole collector.
        let _ = self.tx.send(Notification::Down(self.kind));
    }
}

/// Run one pump to completion.
pub(crate) async fn run_pump(
    kind: StreamKind,
    conn: Arc<dyn NodeConnection>,
    listener: Arc<dyn Listener>,
    tx: mpsc::UnboundedSender<Notification>,
    metrics: SharedMetrics,
) {
    let guard = DownGuard { kind, tx };
    match pump(kind, conn.as_ref(), listener.as_ref(), &guard.tx, &metrics).await {
        Ok(()) => info!(%kind, "stream ended by node"),
        Err(e) => warn!(%kind, error = %e, "stream failed"),
    }
}

async fn pump(
    kind: StreamKind,
    conn: &dyn NodeConnection,
    listener: &dyn Listener,
    tx: &mpsc::UnboundedSender<Notification>,
    metrics: &SharedMetrics,
) -> Result<(), CollectorError> {
    let mut stream = conn.subscribe(kind).await?;
    let _ = tx.send(Notification::Up(kind));
    debug!(%kind, "subscribed");

    let consume = async {
        while let Some(message) = stream.next().await {
            deliver(kind, message?, listener).await?;
            metrics
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .messages_delivered += 1;
        }
        Ok::<_, CollectorError>(())
    };

    if kind == StreamKind::SyncStatus {
        // Keep draining while the command is in flight: the transport stops
        // reading the socket when this subscription's queue is full, and the
        // reply would then never arrive.
        futures::try_join!(conn.sync_start(), consume)?;
        Ok(())
    } else {
        consume.await
    }
}

/// Translate one raw message of `kind` and hand it to the listener.
pub(crate) async fn deliver(
    kind: StreamKind,
    message: Value,
    listener: &dyn Listener,
) -> Result<(), CollectorError> {
    match kind {
        StreamKind::SyncStatus => {
            let status: NodeStatus = serde_json::from_value(message)?;
            listener.on_node_status(&status).await?;
        }
        StreamKind::MeshLayer => {
            let layer: Layer = serde_json::from_value(message)?;
            listener.on_layer(&layer).await?;
        }
        StreamKind::GlobalState => match serde_json::from_value(message)? {
            GlobalStateItem::Account(account) => listener.on_account(&account).await?,
            GlobalStateItem::Reward(reward) => listener.on_reward(&reward).await?,
            GlobalStateItem::Receipt(receipt) => listener.on_transaction_receipt(&receipt).await?,
        },
        StreamKind::NodeError => {
            let err: NodeErrorMessage = serde_json::from_value(message)?;
            err.log();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use meshindex_core::{
        Account, ListenerError, NetworkInfo, Reward, TransactionReceipt,
    };
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn push(&self, e: String) -> Result<(), ListenerError> {
            self.events.lock().unwrap().push(e);
            Ok(())
        }
    }

    #[async_trait]
    impl Listener for Recorder {
        async fn on_network_info(&self, _: &NetworkInfo) -> Result<(), ListenerError> {
            self.push("info".into())
        }
        async fn on_node_status(&self, s: &NodeStatus) -> Result<(), ListenerError> {
            self.push(format!("status:{}", s.top_layer))
        }
        async fn on_layer(&self, l: &Layer) -> Result<(), ListenerError> {
            self.push(format!("layer:{}", l.number))
        }
        async fn on_account(&self, a: &Account) -> Result<(), ListenerError> {
            self.push(format!("account:{}", a.address))
        }
        async fn on_reward(&self, r: &Reward) -> Result<(), ListenerError> {
            self.push(format!("reward:{}", r.layer))
        }
        async fn on_transaction_receipt(
            &self,
            r: &TransactionReceipt,
        ) -> Result<(), ListenerError> {
            self.push(format!("receipt:{}", r.id))
        }
    }

    #[tokio::test]
    async fn routes_each_kind_to_its_listener_method() {
        let rec = Recorder::default();
        deliver(
            StreamKind::SyncStatus,
            json!({"connected_peers": 3, "is_synced": true, "synced_layer": 9, "top_layer": 10, "verified_layer": 8}),
            &rec,
        )
        .await
        .unwrap();
        deliver(StreamKind::MeshLayer, json!({"number": 10}), &rec).await.unwrap();
        deliver(
            StreamKind::GlobalState,
            json!({"account": {"address": "sm1a", "balance": 5, "counter": 1}}),
            &rec,
        )
        .await
        .unwrap();
        deliver(
            StreamKind::GlobalState,
            json!({"receipt": {"id": "0x01", "gas_used": 1, "fee": 2}}),
            &rec,
        )
        .await
        .unwrap();
        deliver(StreamKind::NodeError, json!({"level": "warn", "message": "peer lost"}), &rec)
            .await
            .unwrap();

        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["status:10", "layer:10", "account:sm1a", "receipt:0x01"]
        );
    }

    #[tokio::test]
    async fn undecodable_message_is_an_error() {
        let rec = Recorder::default();
        let err = deliver(StreamKind::MeshLayer, json!({"num": "x"}), &rec)
            .await
            .unwrap_err();
        assert!(matches!(err, CollectorError::Deserialization(_)));
        assert!(rec.events.lock().unwrap().is_empty());
    }

    #[test]
    fn guard_reports_down_on_drop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        {
            let _guard = DownGuard {
                kind: StreamKind::NodeError,
                tx,
            };
        }
        assert_eq!(rx.try_recv().unwrap(), Notification::Down(StreamKind::NodeError));
        assert!(rx.try_recv().is_err());
    }
}
