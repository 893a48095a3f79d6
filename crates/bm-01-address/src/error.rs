//! Error types for the address codec

use shared_codec::CodecError;
use shared_crypto::CryptoError;
use thiserror::Error;

/// Result type alias for address operations
pub type Result<T> = std::result::Result<T, AddressError>;

/// Errors raised while decoding or deriving from an address
#[derive(Debug, Error)]
pub enum AddressError {
    /// String length outside 35..=38
    #[error("Invalid address length: {0}")]
    InvalidLength(usize),

    /// Missing `BM-` prefix
    #[error("Address does not start with BM-")]
    MissingPrefix,

    /// Checksum does not match the payload
    #[error("Address checksum mismatch")]
    ChecksumMismatch,

    /// Version outside 1..=4
    #[error("Unsupported address version: {0}")]
    UnsupportedVersion(u64),

    /// Stream number zero
    #[error("Invalid stream number: {0}")]
    InvalidStream(u64),

    /// Embedded ripe has the wrong length or encoding for its version
    #[error("Invalid ripe encoding for version {version}: {length} bytes")]
    InvalidRipe {
        /// Address version
        version: u64,
        /// Embedded ripe length
        length: usize,
    },

    /// Stored private keys do not hash to the stored ripe
    #[error("Keys do not match address {0}")]
    KeyMismatch(String),

    /// Base58 or varint decoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Key handling failed during identity generation
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl AddressError {
    /// True when the input string itself is bad (as opposed to a local fault).
    pub fn is_malformed_input(&self) -> bool {
        !matches!(self, Self::Crypto(_) | Self::KeyMismatch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(AddressError::ChecksumMismatch.is_malformed_input());
        assert!(AddressError::InvalidLength(10).is_malformed_input());
        assert!(!AddressError::Crypto(CryptoError::InvalidPrivateKey).is_malformed_input());
    }
}
