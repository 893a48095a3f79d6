//! Background worker
//!
//! One tokio task runs queue passes on a timer and on request. Starting is
//! idempotent: the first caller to flip the `running` flag spawns the loop,
//! later callers reuse it.

use crate::error::{QueueError, Result};
use crate::service::QueueProcessor;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Requests accepted by the worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerRequest {
    /// Run a pass now instead of waiting for the timer.
    RunPass,
    /// Finish the loop.
    Stop,
}

/// Owner of the background queue loop.
pub struct BackgroundWorker {
    processor: Arc<QueueProcessor>,
    running: Arc<AtomicBool>,
    sender: Mutex<Option<mpsc::Sender<WorkerRequest>>>,
}

impl BackgroundWorker {
    /// Worker for `processor`; nothing runs until [`start`](Self::start).
    pub fn new(processor: Arc<QueueProcessor>) -> Self {
        Self {
            processor,
            running: Arc::new(AtomicBool::new(false)),
            sender: Mutex::new(None),
        }
    }

    /// True while the loop is alive.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the loop unless it is already running.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }
        let (tx, rx) = mpsc::channel(self.processor.config().channel_capacity.max(1));
        *self.sender.lock() = Some(tx);

        let processor = self.processor.clone();
        let running = self.running.clone();
        info!("Queue worker started");
        Some(tokio::spawn(async move {
            run_loop(processor, rx).await;
            running.store(false, Ordering::SeqCst);
            info!("Queue worker stopped");
        }))
    }

    /// Ask for an immediate pass, starting the loop if needed.
    pub async fn request_pass(&self) -> Result<()> {
        self.start();
        self.send(WorkerRequest::RunPass).await
    }

    /// Stop the loop after the current pass.
    pub async fn stop(&self) -> Result<()> {
        self.send(WorkerRequest::Stop).await?;
        self.sender.lock().take();
        Ok(())
    }

    async fn send(&self, request: WorkerRequest) -> Result<()> {
        let sender = self.sender.lock().clone().ok_or(QueueError::WorkerStopped)?;
        sender
            .send(request)
            .await
            .map_err(|_| QueueError::WorkerStopped)
    }
}

async fn run_loop(processor: Arc<QueueProcessor>, mut requests: mpsc::Receiver<WorkerRequest>) {
    let period = Duration::from_secs(processor.config().pass_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            request = requests.recv() => match request {
                Some(WorkerRequest::RunPass) => debug!("Pass requested"),
                Some(WorkerRequest::Stop) | None => break,
            },
        }
        if let Err(e) = processor.run_pass().await {
            error!(error = %e, "Queue pass failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use bm_02_pow::{PowConfig, PowEngine};
    use bm_03_objects::{ObjectCodec, ObjectConfig, ObjectType};
    use bm_04_pipeline::{
        LogNotifier, MemoryRelay, MessagePipeline, MessagingApi, PipelineConfig, RelayPool,
        StaticConnectivity, Store,
    };
    use shared_types::{ServerRecord, SystemTimeSource, TimeSource};

    fn processor() -> (Arc<QueueProcessor>, Arc<MemoryRelay>) {
        let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let pow = PowEngine::new(PowConfig {
            nonce_trials_per_byte: 1,
            extra_bytes: 1,
            threads: 1,
            ..PowConfig::default()
        });
        let relay = Arc::new(MemoryRelay::new(clock.clone(), pow.clone()));
        let store = Store::in_memory();
        store.servers.add(ServerRecord::new("relay", "", "")).unwrap();
        let pipeline = MessagePipeline::new(
            PipelineConfig::default(),
            ObjectCodec::new(ObjectConfig::default(), pow),
            store.clone(),
            RelayPool::new(relay.clone(), store.servers.clone()),
            Arc::new(LogNotifier),
            clock.clone(),
        )
        .unwrap();
        let processor = QueueProcessor::new(
            QueueConfig::default(),
            Arc::new(pipeline),
            Arc::new(StaticConnectivity::default()),
            clock,
        );
        (Arc::new(processor), relay)
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop_ends_loop() {
        let (processor, _) = processor();
        let worker = BackgroundWorker::new(processor);

        let handle = worker.start().expect("first start spawns");
        assert!(worker.start().is_none());
        assert!(worker.is_running());

        worker.stop().await.unwrap();
        handle.await.unwrap();
        assert!(!worker.is_running());
        assert!(matches!(
            worker.send(WorkerRequest::RunPass).await,
            Err(QueueError::WorkerStopped)
        ));
    }

    #[tokio::test]
    async fn test_requested_pass_runs_queued_work() {
        let (processor, relay) = processor();
        let created = processor
            .pipeline()
            .create_identity("me")
            .await
            .unwrap();
        processor.enqueue_identity(&created).unwrap();

        let worker = BackgroundWorker::new(processor);
        worker.request_pass().await.unwrap();
        worker.stop().await.unwrap();
        while worker.is_running() {
            tokio::task::yield_now().await;
        }
        assert_eq!(relay.objects_of_type(ObjectType::Pubkey).len(), 1);
    }
}
