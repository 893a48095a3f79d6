//! Error types for proof of work

use thiserror::Error;

/// Result type alias for proof-of-work operations
pub type Result<T> = std::result::Result<T, PowError>;

/// Errors that can occur while computing or checking proof of work
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    /// Difficulty parameters produce a zero divisor
    #[error("Invalid POW parameters: {0}")]
    InvalidParameters(String),

    /// Object too short to carry a nonce and expiration time
    #[error("Object too short for POW: {0} bytes")]
    ObjectTooShort(usize),

    /// Every nonce in the search space was tried
    #[error("Nonce space exhausted without a solution")]
    Exhausted,
}

impl PowError {
    /// Check if error is recoverable (should retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_recoverability() {
        assert!(PowError::Exhausted.is_recoverable());
        assert!(!PowError::ObjectTooShort(3).is_recoverable());
    }
}
