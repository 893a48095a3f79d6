//! # Error Types
//!
//! Persistence errors shared by every store adapter.

use crate::entities::{RecordId, RecordKind};
use thiserror::Error;

/// Errors raised by a record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("{kind} record {id} not found")]
    NotFound {
        /// Table searched.
        kind: RecordKind,
        /// Missing id.
        id: RecordId,
    },

    /// Update or delete of a record that was never added.
    #[error("{0} record has no id")]
    MissingId(RecordKind),

    /// Backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True for expected absence rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
