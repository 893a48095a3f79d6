//! Configuration for identity generation

use serde::Deserialize;

/// Identity generation settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Address version of new identities
    pub version: u64,

    /// Stream of new identities
    pub stream: u64,

    /// Leading zero bytes the ripe must have (shortens the address)
    pub leading_zero_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            version: 4,
            stream: 1,
            leading_zero_bytes: 1,
        }
    }
}
