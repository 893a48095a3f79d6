//! # Node Runtime Library
//!
//! Wiring for the `node-runtime` binary, exposed for tests.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (`BM_CONFIG` file, then `BM_*` overrides)
//! 2. Initialize logging
//! 3. Build subsystems in dependency order
//! 4. Create the first identity if the store has none
//! 5. Queue a relay poll and start the background worker

#![warn(missing_docs)]

pub mod container;
pub mod logging;

use crate::container::{NodeConfig, SubsystemContainer};
use anyhow::{Context, Result};
use bm_04_pipeline::MessagingApi;
use std::sync::Arc;
use tracing::{info, warn};

/// The running node.
pub struct NodeRuntime {
    container: Arc<SubsystemContainer>,
}

impl NodeRuntime {
    /// Build all subsystems.
    pub fn new(config: NodeConfig) -> Result<Self> {
        let container =
            SubsystemContainer::new(config).context("Failed to initialize subsystems")?;
        Ok(Self::from_container(container))
    }

    /// Wrap an already built container.
    pub fn from_container(container: SubsystemContainer) -> Self {
        Self {
            container: Arc::new(container),
        }
    }

    /// Shared handle to the subsystems.
    pub fn container(&self) -> Arc<SubsystemContainer> {
        Arc::clone(&self.container)
    }

    /// Ensure an identity exists, queue polling and start the worker.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Bitmessage Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        if self.container.config.relays.is_empty() {
            warn!("No relay servers configured; queue passes will fail until one is added");
        }

        self.ensure_identity().await?;
        self.container
            .queue
            .ensure_polling()
            .context("Failed to queue relay polling")?;
        self.container.worker.start();
        Ok(())
    }

    async fn ensure_identity(&self) -> Result<()> {
        let existing = self
            .container
            .store
            .addresses
            .all()
            .context("Failed to list identities")?;
        if let Some(first) = existing.first() {
            info!(address = %first.address, count = existing.len(), "Identities loaded");
            return Ok(());
        }

        let label = self
            .container
            .config
            .identity_label
            .clone()
            .unwrap_or_else(|| "default".to_string());
        let created = self
            .container
            .pipeline
            .create_identity(&label)
            .await
            .context("Failed to create identity")?;
        self.container
            .queue
            .enqueue_identity(&created)
            .context("Failed to queue pubkey publication")?;
        info!(address = %created.address.address, "Identity created");
        Ok(())
    }

    /// Stop the worker after its current pass.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.container.worker.stop().await {
            warn!(error = %e, "Worker was not running");
        }
        info!("Shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::RelayConfig;
    use bm_02_pow::PowConfig;
    use shared_types::TaskKind;

    fn config() -> NodeConfig {
        NodeConfig {
            pow: PowConfig {
                nonce_trials_per_byte: 1,
                extra_bytes: 1,
                threads: 1,
                ..PowConfig::default()
            },
            relays: vec![RelayConfig::anonymous("memory://relay")],
            identity_label: Some("test".into()),
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_start_creates_identity_and_schedules_work() {
        let runtime = NodeRuntime::new(config()).unwrap();
        runtime.start().await.unwrap();
        let container = runtime.container();

        let identities = container.store.addresses.all().unwrap();
        assert_eq!(identities.len(), 1);
        assert_eq!(identities[0].label, "test");

        let tasks: Vec<TaskKind> = container
            .store
            .queue
            .all()
            .unwrap()
            .into_iter()
            .map(|r| r.task)
            .collect();
        assert!(tasks.contains(&TaskKind::CheckForMessages));
        assert!(container.worker.is_running());

        // A restart keeps the existing identity.
        runtime.start().await.unwrap();
        assert_eq!(container.store.addresses.all().unwrap().len(), 1);

        runtime.shutdown().await;
    }
}
