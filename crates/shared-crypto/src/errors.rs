//! Crypto error types.

use shared_codec::CodecError;
use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed after the MAC matched (bad padding)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Recomputed MAC does not match the trailing MAC bytes
    #[error("MAC mismatch")]
    MacMismatch,

    /// Ciphertext too short or structurally malformed
    #[error("Malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Ephemeral key used a curve other than secp256k1
    #[error("Unsupported curve type: {0}")]
    UnsupportedCurve(u16),

    /// Invalid key length
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length in bytes
        expected: usize,
        /// Actual key length in bytes
        actual: usize,
    },

    /// Signature did not verify
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Invalid public key (not a point on the curve)
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Invalid private key (zero or out of range)
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// WIF string failed marker or checksum validation
    #[error("Invalid WIF: {0}")]
    InvalidWif(String),

    /// Underlying wire decoding failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl CryptoError {
    /// True when the error means "not encrypted for this key" or
    /// "not authentic" rather than a fault in this process.
    pub fn is_not_for_me(&self) -> bool {
        matches!(
            self,
            Self::MacMismatch | Self::DecryptionFailed(_) | Self::SignatureVerificationFailed
        )
    }
}
