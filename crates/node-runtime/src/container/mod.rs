//! # Subsystem Container
//!
//! Configuration plus the container that owns every initialized service.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, LoggingConfig, NodeConfig, RelayConfig};
pub use subsystems::SubsystemContainer;
