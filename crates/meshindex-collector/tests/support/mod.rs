//! In-process fake node and a recording listener for collector tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use meshindex_collector::{CollectorError, NodeConnection, NodeConnector, NodeStream, StreamKind};
use meshindex_core::{
    Account, Layer, Listener, ListenerError, NetworkInfo, NodeStatus, Reward, TransactionReceipt,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

// ─── Fake node ────────────────────────────────────────────────────────────────

#[derive(Default)]
struct NodeState {
    attempts: usize,
    connect_failures_left: usize,
    network_info_failures_left: usize,
    fail_subscribe_once: HashSet<StreamKind>,
    connections: Vec<Arc<FakeConnection>>,
    /// Ordered record of `connect N` / `close N` events.
    log: Vec<String>,
}

pub struct FakeNode {
    state: Arc<Mutex<NodeState>>,
    info: NetworkInfo,
    status: NodeStatus,
    layers: Vec<Layer>,
}

impl FakeNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_layers(0))
    }

    /// A node that serves layers `0..count` for resync tests.
    pub fn with_layers(count: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(NodeState::default())),
            info: network_info(),
            status: NodeStatus {
                connected_peers: 8,
                is_synced: true,
                synced_layer: count.saturating_sub(1),
                top_layer: count.saturating_sub(1),
                verified_layer: count.saturating_sub(2),
            },
            layers: (0..count).map(layer).collect(),
        }
    }

    pub fn fail_connects(&self, n: usize) {
        self.state.lock().unwrap().connect_failures_left = n;
    }

    pub fn fail_network_info(&self, n: usize) {
        self.state.lock().unwrap().network_info_failures_left = n;
    }

    pub fn fail_subscribe_once(&self, kind: StreamKind) {
        self.state.lock().unwrap().fail_subscribe_once.insert(kind);
    }

    /// Connect attempts, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().unwrap().attempts
    }

    pub fn connections(&self) -> Vec<Arc<FakeConnection>> {
        self.state.lock().unwrap().connections.clone()
    }

    pub fn connection(&self, generation: usize) -> Arc<FakeConnection> {
        self.connections()[generation].clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }
}

#[async_trait]
impl NodeConnector for FakeNode {
    async fn connect(&self) -> Result<Arc<dyn NodeConnection>, CollectorError> {
        let mut state = self.state.lock().unwrap();
        state.attempts += 1;
        if state.connect_failures_left > 0 {
            state.connect_failures_left -= 1;
            return Err(CollectorError::Connect("connection refused".into()));
        }
        let generation = state.connections.len();
        let conn = Arc::new(FakeConnection {
            generation,
            node: Arc::clone(&self.state),
            info: self.info.clone(),
            status: self.status,
            layers: self.layers.clone(),
            feeds: Mutex::new(HashMap::new()),
            subscribed: Mutex::new(vec![]),
            layer_queries: Mutex::new(vec![]),
            sync_starts: AtomicUsize::new(0),
            closed: Mutex::new(false),
        });
        state.connections.push(Arc::clone(&conn));
        state.log.push(format!("connect {generation}"));
        Ok(conn)
    }

    fn endpoint(&self) -> &str {
        "fake://node"
    }
}

type Feed = mpsc::UnboundedSender<Result<Value, CollectorError>>;

pub struct FakeConnection {
    pub generation: usize,
    node: Arc<Mutex<NodeState>>,
    info: NetworkInfo,
    status: NodeStatus,
    layers: Vec<Layer>,
    feeds: Mutex<HashMap<StreamKind, Feed>>,
    subscribed: Mutex<Vec<StreamKind>>,
    layer_queries: Mutex<Vec<(u32, u32)>>,
    sync_starts: AtomicUsize,
    closed: Mutex<bool>,
}

impl FakeConnection {
    /// Push a message on an open subscription. Returns `false` if there is
    /// none.
    pub fn push(&self, kind: StreamKind, message: Value) -> bool {
        match self.feeds.lock().unwrap().get(&kind) {
            Some(feed) => feed.send(Ok(message)).is_ok(),
            None => false,
        }
    }

    /// Deliver a transport error on a subscription.
    pub fn fail(&self, kind: StreamKind, reason: &str) {
        if let Some(feed) = self.feeds.lock().unwrap().get(&kind) {
            let _ = feed.send(Err(CollectorError::Stream(reason.into())));
        }
    }

    /// Complete a subscription from the node side.
    pub fn end(&self, kind: StreamKind) {
        self.feeds.lock().unwrap().remove(&kind);
    }

    pub fn subscriptions(&self) -> Vec<StreamKind> {
        self.subscribed.lock().unwrap().clone()
    }

    pub fn sync_starts(&self) -> usize {
        self.sync_starts.load(Ordering::SeqCst)
    }

    pub fn layer_queries(&self) -> Vec<(u32, u32)> {
        self.layer_queries.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    fn check_open(&self) -> Result<(), CollectorError> {
        if self.is_closed() {
            Err(CollectorError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NodeConnection for FakeConnection {
    async fn network_info(&self) -> Result<NetworkInfo, CollectorError> {
        self.check_open()?;
        let mut node = self.node.lock().unwrap();
        if node.network_info_failures_left > 0 {
            node.network_info_failures_left -= 1;
            return Err(CollectorError::Rpc {
                code: -32000,
                message: "genesis unavailable".into(),
            });
        }
        Ok(self.info.clone())
    }

    async fn node_status(&self) -> Result<NodeStatus, CollectorError> {
        self.check_open()?;
        Ok(self.status)
    }

    async fn sync_start(&self) -> Result<(), CollectorError> {
        self.check_open()?;
        self.sync_starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn layers(&self, from: u32, to: u32) -> Result<Vec<Layer>, CollectorError> {
        self.check_open()?;
        self.layer_queries.lock().unwrap().push((from, to));
        Ok(self
            .layers
            .iter()
            .filter(|l| l.number >= from && l.number <= to)
            .cloned()
            .collect())
    }

    async fn subscribe(&self, kind: StreamKind) -> Result<NodeStream, CollectorError> {
        // held until the feed is registered so a concurrent close cannot
        // miss it
        let closed = self.closed.lock().unwrap();
        if *closed {
            return Err(CollectorError::Closed);
        }
        if self.node.lock().unwrap().fail_subscribe_once.remove(&kind) {
            return Err(CollectorError::Stream(format!("{kind} unavailable")));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.feeds.lock().unwrap().insert(kind, tx);
        self.subscribed.lock().unwrap().push(kind);
        Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        })))
    }

    async fn close(&self) {
        let mut closed = self.closed.lock().unwrap();
        if !*closed {
            *closed = true;
            self.feeds.lock().unwrap().clear();
            self.node
                .lock()
                .unwrap()
                .log
                .push(format!("close {}", self.generation));
        }
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn network_info() -> NetworkInfo {
    NetworkInfo {
        net_id: "0x9eeb".into(),
        genesis_time: 1_000,
        epoch_num_layers: 10,
        max_tx_per_second: 100,
        layer_duration: 5,
    }
}

pub fn layer(number: u32) -> Layer {
    Layer {
        number,
        status: Default::default(),
        hash: format!("0x{number:04x}"),
        blocks: vec![],
        activations: vec![],
    }
}

pub fn layer_json(number: u32) -> Value {
    json!({ "number": number, "status": "applied" })
}

// ─── Recording listener ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NetworkInfo,
    Status(u32),
    Layer(u32),
    Account(String),
    Reward(u32),
    Receipt(String),
    EpochStats(u32),
}

#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
    reject_layer: Option<u32>,
    panic_on_layer: Option<u32>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting_layer(layer: u32) -> Arc<Self> {
        Arc::new(Self {
            reject_layer: Some(layer),
            ..Self::default()
        })
    }

    pub fn panicking_on_layer(layer: u32) -> Arc<Self> {
        Arc::new(Self {
            panic_on_layer: Some(layer),
            ..Self::default()
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn layers(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Layer(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: Event) -> Result<(), ListenerError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

#[async_trait]
impl Listener for RecordingListener {
    async fn on_network_info(&self, _: &NetworkInfo) -> Result<(), ListenerError> {
        self.record(Event::NetworkInfo)
    }

    async fn on_node_status(&self, status: &NodeStatus) -> Result<(), ListenerError> {
        self.record(Event::Status(status.top_layer))
    }

    async fn on_layer(&self, layer: &Layer) -> Result<(), ListenerError> {
        if self.panic_on_layer == Some(layer.number) {
            panic!("listener blew up on layer {}", layer.number);
        }
        if self.reject_layer == Some(layer.number) {
            return Err(ListenerError::rejected("layer", "storage refused"));
        }
        self.record(Event::Layer(layer.number))
    }

    async fn on_account(&self, account: &Account) -> Result<(), ListenerError> {
        self.record(Event::Account(account.address.clone()))
    }

    async fn on_reward(&self, reward: &Reward) -> Result<(), ListenerError> {
        self.record(Event::Reward(reward.layer))
    }

    async fn on_transaction_receipt(
        &self,
        receipt: &TransactionReceipt,
    ) -> Result<(), ListenerError> {
        self.record(Event::Receipt(receipt.id.clone()))
    }

    async fn recalculate_epoch_stats(&self, epoch: u32) -> Result<(), ListenerError> {
        self.record(Event::EpochStats(epoch))
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Poll `cond` until it holds, failing the test after five seconds.
pub async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
