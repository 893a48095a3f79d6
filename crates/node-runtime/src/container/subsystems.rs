//! # Subsystem Container
//!
//! Builds every service once, in dependency order, and hands out shared
//! handles:
//!
//! ```text
//! clock ─┬─→ PowEngine ─→ ObjectCodec ─┐
//!        │                             ├─→ MessagePipeline ─→ QueueProcessor ─→ BackgroundWorker
//!        ├─→ MemoryRelay ─→ RelayPool ─┘
//!        └─→ Store (servers seeded from config)
//! ```

use crate::container::config::NodeConfig;
use bm_02_pow::PowEngine;
use bm_03_objects::ObjectCodec;
use bm_04_pipeline::{
    LogNotifier, MemoryRelay, MessagePipeline, PipelineError, RelayPool, StaticConnectivity,
    Store,
};
use bm_05_queue::{BackgroundWorker, QueueProcessor};
use shared_types::{ServerRecord, SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::info;

/// All initialized services.
pub struct SubsystemContainer {
    /// Configuration the container was built from.
    pub config: NodeConfig,
    /// Wall clock.
    pub clock: Arc<dyn TimeSource>,
    /// Record store.
    pub store: Store,
    /// In-process relay network.
    pub relay: Arc<MemoryRelay>,
    /// Connectivity flag consulted before each queue pass.
    pub connectivity: Arc<StaticConnectivity>,
    /// Message pipeline.
    pub pipeline: Arc<MessagePipeline>,
    /// Queue processor.
    pub queue: Arc<QueueProcessor>,
    /// Background queue loop.
    pub worker: BackgroundWorker,
}

impl SubsystemContainer {
    /// Build every subsystem from `config`.
    pub fn new(config: NodeConfig) -> Result<Self, PipelineError> {
        Self::with_clock(config, Arc::new(SystemTimeSource))
    }

    /// Same as [`new`](Self::new) with an explicit clock.
    pub fn with_clock(config: NodeConfig, clock: Arc<dyn TimeSource>) -> Result<Self, PipelineError> {
        let pow = PowEngine::new(config.pow.clone());
        let codec = ObjectCodec::new(config.pipeline.objects.clone(), pow.clone());

        let store = Store::in_memory();
        for relay in &config.relays {
            store.servers.add(ServerRecord::new(
                relay.url.clone(),
                relay.username.clone(),
                relay.password.clone(),
            ))?;
        }
        info!(relays = config.relays.len(), pow = pow.enabled(), "Store initialized");

        let relay = Arc::new(MemoryRelay::new(clock.clone(), pow));
        let relays = RelayPool::new(relay.clone(), store.servers.clone());
        let pipeline = Arc::new(MessagePipeline::new(
            config.pipeline.clone(),
            codec,
            store.clone(),
            relays,
            Arc::new(LogNotifier),
            clock.clone(),
        )?);

        let connectivity = Arc::new(StaticConnectivity::default());
        let queue = Arc::new(QueueProcessor::new(
            config.queue.clone(),
            pipeline.clone(),
            connectivity.clone(),
            clock.clone(),
        ));
        let worker = BackgroundWorker::new(queue.clone());

        Ok(Self {
            config,
            clock,
            store,
            relay,
            connectivity,
            pipeline,
            queue,
            worker,
        })
    }
}
