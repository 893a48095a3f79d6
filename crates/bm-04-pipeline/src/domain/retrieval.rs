//! Pubkey retrieval outcome

use shared_types::{PayloadRecord, PubkeyRecord};

/// Result of looking for a recipient's pubkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalResult {
    /// Pubkey known; sending can proceed.
    Found(PubkeyRecord),
    /// Not known yet; this getpubkey request is out on the network.
    Pending(PayloadRecord),
}

impl RetrievalResult {
    /// The pubkey, if found.
    pub fn pubkey(&self) -> Option<&PubkeyRecord> {
        match self {
            Self::Found(pubkey) => Some(pubkey),
            Self::Pending(_) => None,
        }
    }

    /// True while waiting for the network.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}
