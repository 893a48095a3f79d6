//! Fixed-width big-endian integers.

use crate::CodecError;

/// Encode a u16 big-endian.
#[inline]
pub fn encode_u16(value: u16) -> [u8; 2] {
    value.to_be_bytes()
}

/// Encode a u32 big-endian.
#[inline]
pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Encode a u64 big-endian.
#[inline]
pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

fn take<const N: usize>(bytes: &[u8]) -> Result<[u8; N], CodecError> {
    bytes
        .get(..N)
        .and_then(|s| s.try_into().ok())
        .ok_or(CodecError::Truncated {
            needed: N,
            available: bytes.len(),
        })
}

/// Decode a big-endian u16 from the front of `bytes`.
pub fn decode_u16(bytes: &[u8]) -> Result<u16, CodecError> {
    take::<2>(bytes).map(u16::from_be_bytes)
}

/// Decode a big-endian u32 from the front of `bytes`.
pub fn decode_u32(bytes: &[u8]) -> Result<u32, CodecError> {
    take::<4>(bytes).map(u32::from_be_bytes)
}

/// Decode a big-endian u64 from the front of `bytes`.
pub fn decode_u64(bytes: &[u8]) -> Result<u64, CodecError> {
    take::<8>(bytes).map(u64::from_be_bytes)
}
