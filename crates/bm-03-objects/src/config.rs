//! Configuration for object construction

use serde::Deserialize;

/// Lifetimes and flags for objects we build
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ObjectConfig {
    /// Lifetime of our pubkey objects (seconds)
    pub pubkey_ttl: u64,

    /// Lifetime of getpubkey requests (seconds)
    pub getpubkey_ttl: u64,

    /// Ask recipients to acknowledge our messages
    pub request_acks: bool,
}

impl Default for ObjectConfig {
    fn default() -> Self {
        Self {
            pubkey_ttl: 28 * 24 * 60 * 60,
            getpubkey_ttl: 2 * 24 * 60 * 60,
            request_acks: true,
        }
    }
}
