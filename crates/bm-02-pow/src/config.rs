//! Configuration types for proof of work

use crate::domain::PowParameters;
use serde::Deserialize;

/// Proof-of-work settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Solve locally; when false the relay is asked to do it
    pub enabled: bool,

    /// Network minimum nonce trials per byte
    pub nonce_trials_per_byte: u64,

    /// Network minimum extra bytes
    pub extra_bytes: u64,

    /// Worker threads (0 = one per core)
    pub threads: usize,

    /// Floor applied to the time-to-live in the target formula
    pub minimum_ttl: u64,

    /// Highest nonce tried before giving up (None = whole u64 space)
    pub max_nonce: Option<u64>,
}

impl PowConfig {
    /// Network minimum difficulty as parameters.
    pub fn network_minimum(&self) -> PowParameters {
        PowParameters::new(self.nonce_trials_per_byte, self.extra_bytes)
    }

    /// Effective worker count.
    pub fn worker_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get().max(1)
        } else {
            self.threads
        }
    }
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nonce_trials_per_byte: crate::NETWORK_NONCE_TRIALS_PER_BYTE,
            extra_bytes: crate::NETWORK_EXTRA_BYTES,
            threads: 0,
            minimum_ttl: crate::MINIMUM_TTL,
            max_nonce: None,
        }
    }
}
