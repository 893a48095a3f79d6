//! Configuration for the task queue

use serde::Deserialize;

/// Queue settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// A task failing more often than this is abandoned
    pub max_attempts: u32,

    /// Seconds between background passes
    pub pass_interval_secs: u64,

    /// Seconds between relay polls for new objects
    pub check_interval_secs: u64,

    /// Capacity of the worker request channel
    pub channel_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 500,
            pass_interval_secs: 60,
            check_interval_secs: 5 * 60,
            channel_capacity: 32,
        }
    }
}
