//! WebSocket JSON-RPC node connection.
//!
//! A background task owns the socket and multiplexes requests and
//! subscriptions over it. The connection never reconnects on its own: once
//! the socket is gone every pending request fails with
//! [`CollectorError::Closed`] and every subscription stream ends, which is
//! exactly the signal the collector's pumps need.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshindex_core::{Layer, NetworkInfo, NodeStatus};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::config::CollectorConfig;
use crate::error::CollectorError;
use crate::stream::{NodeConnection, NodeConnector, NodeStream, StreamKind};
use crate::ws::rpc::{self, Incoming, Request};
use crate::ws::subscriptions::SubscriptionRegistry;

/// Opens [`WsConnection`]s to one node endpoint.
#[derive(Debug, Clone)]
pub struct WsNodeConnector {
    url: String,
    request_timeout: Duration,
    stream_buffer: usize,
}

impl WsNodeConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self::from_config(&CollectorConfig::for_node(url))
    }

    pub fn from_config(config: &CollectorConfig) -> Self {
        Self {
            url: config.node_url.clone(),
            request_timeout: config.request_timeout(),
            stream_buffer: config.stream_buffer,
        }
    }
}

#[async_trait]
impl NodeConnector for WsNodeConnector {
    async fn connect(&self) -> Result<Arc<dyn NodeConnection>, CollectorError> {
        let conn = WsConnection::open(&self.url, self.request_timeout, self.stream_buffer).await?;
        Ok(Arc::new(conn))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

type Reply<T> = oneshot::Sender<Result<T, CollectorError>>;

/// Command sent from callers to the connection task.
enum Command {
    Call {
        method: &'static str,
        params: Value,
        reply: Reply<Value>,
    },
    Subscribe {
        kind: StreamKind,
        reply: Reply<mpsc::Receiver<Value>>,
    },
    Close,
}

/// Request awaiting its response.
enum Pending {
    Call(Reply<Value>),
    Subscribe(Reply<mpsc::Receiver<Value>>),
}

impl Pending {
    fn fail(self, err: CollectorError) {
        match self {
            Pending::Call(reply) => {
                let _ = reply.send(Err(err));
            }
            Pending::Subscribe(reply) => {
                let _ = reply.send(Err(err));
            }
        }
    }
}

/// One open WebSocket connection to a node.
pub struct WsConnection {
    url: String,
    cmd_tx: mpsc::UnboundedSender<Command>,
    request_timeout: Duration,
}

impl WsConnection {
    /// Connect to `url` and start the connection task.
    pub async fn open(
        url: &str,
        request_timeout: Duration,
        stream_buffer: usize,
    ) -> Result<Self, CollectorError> {
        let connect = tokio_tungstenite::connect_async(url);
        let (socket, _) = tokio::time::timeout(request_timeout, connect)
            .await
            .map_err(|_| CollectorError::Timeout {
                ms: request_timeout.as_millis() as u64,
            })?
            .map_err(|e| CollectorError::Connect(format!("{url}: {e}")))?;
        info!(url, "websocket connected");

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(connection_task(
            url.to_string(),
            socket,
            cmd_rx,
            SubscriptionRegistry::new(stream_buffer),
        ));

        Ok(Self {
            url: url.to_string(),
            cmd_tx,
            request_timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> Result<T, CollectorError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .map_err(|_| CollectorError::Closed)?;
        match tokio::time::timeout(self.request_timeout, rx).await {
            Err(_) => Err(CollectorError::Timeout {
                ms: self.request_timeout.as_millis() as u64,
            }),
            Ok(Err(_)) => Err(CollectorError::Closed),
            Ok(Ok(result)) => result,
        }
    }

    /// Issue a JSON-RPC call and deserialize its result.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, CollectorError> {
        let value = self
            .request(|reply| Command::Call {
                method,
                params,
                reply,
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Close);
    }
}

#[async_trait]
impl NodeConnection for WsConnection {
    async fn network_info(&self) -> Result<NetworkInfo, CollectorError> {
        let (genesis_time, net_id, epoch_num_layers, max_tx_per_second, layer_duration) = futures::try_join!(
            self.call::<i64>(rpc::GENESIS_TIME, json!([])),
            self.call::<String>(rpc::GENESIS_ID, json!([])),
            self.call::<u32>(rpc::EPOCH_NUM_LAYERS, json!([])),
            self.call::<u32>(rpc::MAX_TX_PER_SECOND, json!([])),
            self.call::<u64>(rpc::LAYER_DURATION, json!([])),
        )?;
        Ok(NetworkInfo {
            net_id,
            genesis_time,
            epoch_num_layers,
            max_tx_per_second,
            layer_duration,
        })
    }

    async fn node_status(&self) -> Result<NodeStatus, CollectorError> {
        self.call(rpc::NODE_STATUS, json!([])).await
    }

    async fn sync_start(&self) -> Result<(), CollectorError> {
        self.call::<Value>(rpc::SYNC_START, json!([])).await.map(|_| ())
    }

    async fn layers(&self, from: u32, to: u32) -> Result<Vec<Layer>, CollectorError> {
        self.call(
            rpc::LAYERS_QUERY,
            json!([{ "start_layer": from, "end_layer": to }]),
        )
        .await
    }

    async fn subscribe(&self, kind: StreamKind) -> Result<NodeStream, CollectorError> {
        let rx = self
            .request(|reply| Command::Subscribe { kind, reply })
            .await?;
        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|v| (Ok::<_, CollectorError>(v), rx))
        });
        Ok(Box::pin(stream))
    }

    async fn close(&self) {
        let _ = self.cmd_tx.send(Command::Close);
    }
}

/// Background task that owns the socket.
async fn connection_task<S>(
    url: String,
    socket: S,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut subscriptions: SubscriptionRegistry,
) where
    S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Unpin,
{
    let (mut sink, mut source) = socket.split();
    let mut pending: HashMap<u64, Pending> = HashMap::new();
    let mut next_id: u64 = 1;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let (method, params, entry) = match cmd {
                    None | Some(Command::Close) => break,
                    Some(Command::Call { method, params, reply }) => {
                        (method, params, Pending::Call(reply))
                    }
                    Some(Command::Subscribe { kind, reply }) => {
                        (rpc::SUBSCRIBE, json!([kind.as_str()]), Pending::Subscribe(reply))
                    }
                };
                let id = next_id;
                next_id += 1;
                let text = match Request::new(id, method, &params).to_text() {
                    Ok(text) => text,
                    Err(e) => {
                        entry.fail(e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!(url = %url, error = %e, "websocket send failed");
                    entry.fail(CollectorError::Closed);
                    break;
                }
                pending.insert(id, entry);
            }
            msg = source.next() => {
                match msg {
                    None => break,
                    Some(Err(e)) => {
                        warn!(url = %url, error = %e, "websocket receive error");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        // Awaits a full subscriber queue: back-pressure reaches the
                        // node through the socket.
                        handle_text(text.as_str(), &mut pending, &mut subscriptions).await;
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    let _ = sink.close().await;
    subscriptions.clear();
    for (_, entry) in pending.drain() {
        entry.fail(CollectorError::Closed);
    }
    debug!(url = %url, "websocket connection closed");
}

async fn handle_text(
    text: &str,
    pending: &mut HashMap<u64, Pending>,
    subscriptions: &mut SubscriptionRegistry,
) {
    match rpc::classify(text) {
        Incoming::Notification {
            subscription,
            result,
        } => subscriptions.dispatch(&subscription, result).await,
        Incoming::Response { id, result } => match pending.remove(&id) {
            Some(Pending::Call(reply)) => {
                let _ = reply.send(result);
            }
            Some(Pending::Subscribe(reply)) => {
                let registered = result.and_then(|v| {
                    rpc::subscription_key(&v).ok_or_else(|| {
                        CollectorError::Stream(format!("invalid subscription id {v}"))
                    })
                });
                match registered {
                    Ok(sub_id) => {
                        let rx = subscriptions.register(sub_id.clone());
                        // Caller gave up waiting: forget the subscription.
                        if reply.send(Ok(rx)).is_err() {
                            subscriptions.remove(&sub_id);
                        }
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            None => debug!(id, "response for unknown request"),
        },
        Incoming::Unknown => debug!("ignoring unrecognized websocket frame"),
    }
}
