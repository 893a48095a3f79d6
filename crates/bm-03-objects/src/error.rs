//! Error types for the object codec

use bm_01_address::AddressError;
use bm_02_pow::PowError;
use shared_codec::CodecError;
use shared_crypto::CryptoError;
use shared_types::Timestamp;
use thiserror::Error;

/// Result type alias for object operations
pub type Result<T> = std::result::Result<T, ObjectError>;

/// Errors that can occur while building or parsing objects
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Truncated or malformed field
    #[error("Malformed object: {0}")]
    Codec(#[from] CodecError),

    /// Encryption, decryption or signing failed
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Address could not be decoded
    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    /// POW could not be computed or checked
    #[error("POW error: {0}")]
    Pow(#[from] PowError),

    /// Object type outside the known set
    #[error("Unknown object type: {0}")]
    UnknownObjectType(u32),

    /// Object of the wrong type for the requested parse
    #[error("Expected {expected} object, got {actual}")]
    UnexpectedObjectType {
        /// Type the caller asked for
        expected: &'static str,
        /// Type found in the envelope
        actual: &'static str,
    },

    /// Object version outside the supported range
    #[error("Unsupported {object_type} version: {version}")]
    UnsupportedVersion {
        /// Object type name
        object_type: &'static str,
        /// Version found
        version: u64,
    },

    /// Stream other than 1
    #[error("Unsupported stream: {0}")]
    UnsupportedStream(u64),

    /// Nonce does not satisfy the target
    #[error("Insufficient proof of work")]
    InsufficientPow,

    /// Expiration beyond the network maximum
    #[error("Expiration {expiration} too far ahead of {now}")]
    ExpiresTooFarAhead {
        /// Object expiration
        expiration: Timestamp,
        /// Local time
        now: Timestamp,
    },

    /// Expired longer ago than the grace period
    #[error("Object expired at {expiration}, now {now}")]
    Expired {
        /// Object expiration
        expiration: Timestamp,
        /// Local time
        now: Timestamp,
    },

    /// Pre-cutover object layout
    #[error("Legacy object format (expiration {0})")]
    LegacyFormat(Timestamp),

    /// v4 pubkey tag does not belong to the requested address
    #[error("Pubkey tag does not match the address")]
    TagMismatch,

    /// Keys in a pubkey do not hash to the address ripe
    #[error("Pubkey keys do not match the address ripe")]
    RipeMismatch,

    /// Msg was encrypted for us but addressed to another ripe
    #[error("Destination ripe does not match the receiving address")]
    DestinationMismatch,

    /// Embedded signature does not verify
    #[error("Invalid signature")]
    InvalidSignature,

    /// None of our keys could decrypt the object
    #[error("Object not encrypted for any owned address")]
    NotForMe,

    /// Network header around an ack is malformed
    #[error("Invalid network header: {0}")]
    InvalidNetworkHeader(String),
}

impl ObjectError {
    /// True when the object is simply not ours or not authentic.
    pub fn is_not_for_me(&self) -> bool {
        match self {
            Self::NotForMe | Self::InvalidSignature | Self::DestinationMismatch => true,
            Self::Crypto(e) => e.is_not_for_me(),
            _ => false,
        }
    }

    /// True when the bytes themselves are invalid.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::Codec(_)
                | Self::Address(_)
                | Self::UnknownObjectType(_)
                | Self::UnexpectedObjectType { .. }
                | Self::UnsupportedVersion { .. }
                | Self::UnsupportedStream(_)
                | Self::InsufficientPow
                | Self::ExpiresTooFarAhead { .. }
                | Self::Expired { .. }
                | Self::LegacyFormat(_)
                | Self::InvalidNetworkHeader(_)
        )
    }
}
