//! Configuration for the message pipeline

use bm_01_address::GenerationConfig;
use bm_03_objects::ObjectConfig;
use serde::Deserialize;

/// Pipeline settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Lifetime of a message on its first send (seconds)
    pub first_attempt_ttl: u64,

    /// Lifetime of resent messages (seconds)
    pub resend_ttl: u64,

    /// Re-publish our pubkeys this long before they expire (seconds)
    pub pubkey_refresh_margin: u64,

    /// How far back the first object fetch looks (seconds)
    pub initial_fetch_lookback: u64,

    /// Object construction settings
    pub objects: ObjectConfig,

    /// New identity settings
    pub identities: GenerationConfig,
}

impl PipelineConfig {
    /// Message lifetime for send number `record_count` (0 = first).
    pub fn message_ttl(&self, record_count: u32) -> u64 {
        if record_count == 0 {
            self.first_attempt_ttl
        } else {
            self.resend_ttl
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            first_attempt_ttl: 60 * 60,
            resend_ttl: 4 * 24 * 60 * 60,
            pubkey_refresh_margin: 24 * 60 * 60,
            initial_fetch_lookback: 2 * 24 * 60 * 60,
            objects: ObjectConfig::default(),
            identities: GenerationConfig::default(),
        }
    }
}
