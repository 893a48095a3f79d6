//! Base58 with the Bitcoin alphabet.
//!
//! No version byte is prepended here; callers own their framing.

use crate::CodecError;

/// Encode bytes as Base58.
pub fn encode_base58(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Decode a Base58 string.
///
/// # Errors
///
/// Returns `CodecError::InvalidBase58` for characters outside the alphabet.
pub fn decode_base58(input: &str) -> Result<Vec<u8>, CodecError> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| CodecError::InvalidBase58(e.to_string()))
}
