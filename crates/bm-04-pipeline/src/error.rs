//! Error types for the message pipeline

use bm_01_address::AddressError;
use bm_02_pow::PowError;
use bm_03_objects::ObjectError;
use shared_types::StoreError;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures talking to relay servers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Server could not be reached
    #[error("Server {url} unreachable: {reason}")]
    Unreachable {
        /// Endpoint
        url: String,
        /// Transport message
        reason: String,
    },

    /// Server answered with an error
    #[error("Server {url} rejected the request: {reason}")]
    Rejected {
        /// Endpoint
        url: String,
        /// Server message
        reason: String,
    },

    /// No relay servers configured
    #[error("No relay servers configured")]
    NoServers,

    /// Every server failed
    #[error("All {attempted} relay servers failed")]
    Exhausted {
        /// Servers tried
        attempted: usize,
    },
}

/// Errors that can occur in the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Persistence failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Object could not be built or parsed
    #[error("Object error: {0}")]
    Object(#[from] ObjectError),

    /// Address or identity could not be decoded
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// Relay communication failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Sender address is not one of ours
    #[error("No identity for address {0}")]
    UnknownIdentity(String),

    /// Recipient address is malformed
    #[error("Invalid recipient address {address}: {reason}")]
    InvalidRecipient {
        /// Address as entered
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// Blocking POW task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Worker(String),
}

impl PipelineError {
    /// True when a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Worker(_) => true,
            Self::Store(e) => !e.is_not_found(),
            Self::Object(ObjectError::Pow(e)) => e.is_recoverable(),
            Self::Object(_)
            | Self::Address(_)
            | Self::UnknownIdentity(_)
            | Self::InvalidRecipient { .. } => false,
        }
    }
}

impl From<PowError> for PipelineError {
    fn from(e: PowError) -> Self {
        Self::Object(ObjectError::Pow(e))
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Worker(e.to_string())
    }
}
