//! Codec error types.

use thiserror::Error;

/// Errors raised while decoding wire data.
///
/// Every variant is a malformed-input failure: callers reject the input
/// outright rather than attempting partial recovery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before the expected number of bytes
    #[error("Truncated input: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes required to finish the read
        needed: usize,
        /// Bytes actually left
        available: usize,
    },

    /// A negative value was offered to an unsigned encoding
    #[error("Negative value cannot be encoded: {0}")]
    NegativeValue(i64),

    /// Varint used a wider form than its value requires
    #[error("Non-minimal varint encoding: value {value} used marker {marker:#04x}")]
    NonMinimalVarint {
        /// Decoded value
        value: u64,
        /// Marker byte that introduced the encoding
        marker: u8,
    },

    /// Field had the wrong length
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        actual: usize,
    },

    /// Range copy outside the source slice
    #[error("Invalid range {start}..{end} for input of {len} bytes")]
    InvalidRange {
        /// Range start
        start: usize,
        /// Range end (exclusive)
        end: usize,
        /// Source length
        len: usize,
    },

    /// String contained characters outside the Base58 alphabet
    #[error("Invalid Base58 input: {0}")]
    InvalidBase58(String),
}
