//! Error types for the task queue

use bm_04_pipeline::PipelineError;
use shared_types::{RecordKind, StoreError, TaskKind};
use thiserror::Error;

/// Result type alias for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;

/// Errors that can occur while running tasks
#[derive(Debug, Error)]
pub enum QueueError {
    /// A pipeline step failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Queue persistence failed
    #[error("Queue store error: {0}")]
    Store(#[from] StoreError),

    /// A task lacks a reference its kind requires
    #[error("{task} task has no {kind} reference")]
    MissingReference {
        /// Task kind
        task: TaskKind,
        /// Missing reference kind
        kind: RecordKind,
    },

    /// The background worker is not accepting requests
    #[error("Background worker stopped")]
    WorkerStopped,
}

impl QueueError {
    /// Worth another attempt later.
    pub fn is_retryable(&self) -> bool {
        match self {
            QueueError::Pipeline(e) => e.is_retryable(),
            QueueError::Store(e) => !e.is_not_found(),
            QueueError::MissingReference { .. } => false,
            QueueError::WorkerStopped => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_04_pipeline::TransportError;

    #[test]
    fn test_retryable_classification() {
        let transport: QueueError =
            PipelineError::from(TransportError::Exhausted { attempted: 2 }).into();
        assert!(transport.is_retryable());

        let bad_address: QueueError = PipelineError::InvalidRecipient {
            address: "BM-x".into(),
            reason: "checksum".into(),
        }
        .into();
        assert!(!bad_address.is_retryable());

        let missing = QueueError::MissingReference {
            task: TaskKind::SendMessage,
            kind: RecordKind::Message,
        };
        assert!(!missing.is_retryable());
        assert!(!QueueError::from(StoreError::NotFound {
            kind: RecordKind::Payload,
            id: 1
        })
        .is_retryable());
    }
}
