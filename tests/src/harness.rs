//! Simulated network of nodes sharing one in-memory relay network and one
//! manual clock. Every node has its own store and queue.

use bm_02_pow::{PowConfig, PowEngine};
use bm_03_objects::{ObjectCodec, ObjectConfig};
use bm_04_pipeline::{
    CountingNotifier, MemoryRelay, MessagePipeline, MessagingApi, PipelineConfig, RelayPool,
    StaticConnectivity, Store,
};
use bm_05_queue::{PassReport, QueueConfig, QueueProcessor};
use shared_types::{
    ManualTimeSource, MessageField, MessageRecord, MessageStatus, QueueField, QueueRecord,
    RecordId, ServerRecord, TaskKind, Timestamp,
};
use std::sync::Arc;

/// Clock start for every simulated network.
pub const START: Timestamp = 1_700_000_000;

/// Seconds the clock moves per [`TestNetwork::step`].
pub const STEP_SECS: u64 = 2;

/// Cheapest difficulty that still exercises the solver.
pub fn fast_pow() -> PowConfig {
    PowConfig {
        nonce_trials_per_byte: 1,
        extra_bytes: 1,
        threads: 2,
        ..PowConfig::default()
    }
}

/// Queue settings that poll on every step.
pub fn eager_queue() -> QueueConfig {
    QueueConfig {
        check_interval_secs: 1,
        ..QueueConfig::default()
    }
}

/// Relays plus clock.
pub struct TestNetwork {
    /// Shared clock.
    pub clock: Arc<ManualTimeSource>,
    /// Shared relay network.
    pub relay: Arc<MemoryRelay>,
    urls: Vec<String>,
}

impl TestNetwork {
    /// Network with `relays` servers named `relay-0..`.
    pub fn new(relays: usize) -> Self {
        let clock = Arc::new(ManualTimeSource::new(START));
        let relay = Arc::new(MemoryRelay::new(clock.clone(), PowEngine::new(fast_pow())));
        Self {
            clock,
            relay,
            urls: (0..relays).map(|i| format!("relay-{}", i)).collect(),
        }
    }

    /// Relay server URLs.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Node with [`eager_queue`] settings.
    pub fn node(&self) -> TestNode {
        self.node_with(eager_queue())
    }

    /// Node with custom queue settings.
    pub fn node_with(&self, queue: QueueConfig) -> TestNode {
        let store = Store::in_memory();
        for url in &self.urls {
            store
                .servers
                .add(ServerRecord::new(url.clone(), "", ""))
                .expect("in-memory store accepts servers");
        }
        let notifier = Arc::new(CountingNotifier::default());
        let pipeline = MessagePipeline::new(
            PipelineConfig::default(),
            ObjectCodec::new(ObjectConfig::default(), PowEngine::new(fast_pow())),
            store.clone(),
            RelayPool::new(self.relay.clone(), store.servers.clone()),
            notifier.clone(),
            self.clock.clone(),
        )
        .expect("default identity settings are valid");
        let connectivity = Arc::new(StaticConnectivity::default());
        let queue = Arc::new(QueueProcessor::new(
            queue,
            Arc::new(pipeline),
            connectivity.clone(),
            self.clock.clone(),
        ));
        TestNode {
            queue,
            store,
            notifier,
            connectivity,
        }
    }

    /// Take every relay off the network (or bring them back).
    pub fn set_all_offline(&self, offline: bool) {
        for url in &self.urls {
            self.relay.set_offline(url, offline);
        }
    }

    /// Advance the clock and run one pass on each node, in order.
    pub async fn step(&self, nodes: &[&TestNode]) -> Vec<PassReport> {
        self.clock.advance(STEP_SECS);
        let mut reports = Vec::with_capacity(nodes.len());
        for node in nodes {
            reports.push(node.queue.run_pass().await.expect("queue pass"));
        }
        reports
    }

    /// Step until `done` holds or `max_steps` ran; returns steps taken.
    pub async fn run_until<F>(&self, nodes: &[&TestNode], max_steps: usize, done: F) -> Option<usize>
    where
        F: Fn() -> bool,
    {
        for step in 1..=max_steps {
            self.step(nodes).await;
            if done() {
                return Some(step);
            }
        }
        None
    }
}

/// One simulated client.
pub struct TestNode {
    /// Queue processor (owns the pipeline).
    pub queue: Arc<QueueProcessor>,
    /// The node's store.
    pub store: Store,
    /// UI signal counts.
    pub notifier: Arc<CountingNotifier>,
    /// Connectivity switch.
    pub connectivity: Arc<StaticConnectivity>,
}

impl TestNode {
    /// The node's pipeline.
    pub fn pipeline(&self) -> &MessagePipeline {
        self.queue.pipeline()
    }

    /// Create an identity, queue its pubkey and start polling.
    pub async fn new_identity(&self, label: &str) -> String {
        let created = self
            .pipeline()
            .create_identity(label)
            .await
            .expect("identity creation");
        self.queue.enqueue_identity(&created).expect("queue pubkey");
        self.queue.ensure_polling().expect("queue polling");
        created.address.address
    }

    /// Submit and queue a message.
    pub async fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> RecordId {
        let message = self
            .pipeline()
            .submit_message(from, to, subject, body)
            .await
            .expect("message accepted");
        let id = message.id.expect("stored message has an id");
        self.queue.enqueue_message(id).expect("queue message");
        id
    }

    /// Current status of message `id`.
    pub fn status(&self, id: RecordId) -> MessageStatus {
        self.store
            .messages
            .search_single(id)
            .expect("message exists")
            .status
    }

    /// Received messages.
    pub fn inbox(&self) -> Vec<MessageRecord> {
        self.store
            .messages
            .search(&MessageField::BelongsToMe(false))
            .expect("store readable")
    }

    /// Queue records of `task`.
    pub fn tasks(&self, task: TaskKind) -> Vec<QueueRecord> {
        self.store
            .queue
            .search(&QueueField::Task(task))
            .expect("store readable")
    }

    /// Queue records of any task.
    pub fn all_tasks(&self) -> Vec<QueueRecord> {
        self.store.queue.all().expect("store readable")
    }
}
