//! # Bitmessage Node Runtime
//!
//! Loads configuration, installs logging, builds the subsystems and drives
//! the task queue until Ctrl+C.

use anyhow::{Context, Result};
use node_runtime::container::NodeConfig;
use node_runtime::logging::init_tracing;
use node_runtime::NodeRuntime;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
