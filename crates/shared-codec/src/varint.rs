//! # Variable-Length Integers
//!
//! | Value range | Encoding |
//! |-------------|----------|
//! | `< 0xfd` | 1 byte |
//! | `< 0x1_0000` | `0xfd` + u16 BE |
//! | `< 0x1_0000_0000` | `0xfe` + u32 BE |
//! | otherwise | `0xff` + u64 BE |
//!
//! Decoding rejects non-minimal forms, matching the reference nodes.

use crate::CodecError;

const MARKER_U16: u8 = 0xfd;
const MARKER_U32: u8 = 0xfe;
const MARKER_U64: u8 = 0xff;

/// Encode an unsigned value as a varint.
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < MARKER_U16 as u64 {
        vec![value as u8]
    } else if value <= u16::MAX as u64 {
        let mut out = Vec::with_capacity(3);
        out.push(MARKER_U16);
        out.extend_from_slice(&(value as u16).to_be_bytes());
        out
    } else if value <= u32::MAX as u64 {
        let mut out = Vec::with_capacity(5);
        out.push(MARKER_U32);
        out.extend_from_slice(&(value as u32).to_be_bytes());
        out
    } else {
        let mut out = Vec::with_capacity(9);
        out.push(MARKER_U64);
        out.extend_from_slice(&value.to_be_bytes());
        out
    }
}

/// Encode a signed value, rejecting negatives.
///
/// # Errors
///
/// Returns `CodecError::NegativeValue` if `value < 0`.
pub fn try_encode_varint(value: i64) -> Result<Vec<u8>, CodecError> {
    if value < 0 {
        return Err(CodecError::NegativeValue(value));
    }
    Ok(encode_varint(value as u64))
}

/// Number of bytes `encode_varint(value)` produces.
pub fn varint_len(value: u64) -> usize {
    if value < MARKER_U16 as u64 {
        1
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Decode a varint from the front of `bytes`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
///
/// - `CodecError::Truncated` if the input ends mid-varint
/// - `CodecError::NonMinimalVarint` if a wider form than needed was used
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize), CodecError> {
    let marker = *bytes.first().ok_or(CodecError::Truncated {
        needed: 1,
        available: 0,
    })?;

    let (width, min) = match marker {
        MARKER_U16 => (2, MARKER_U16 as u64),
        MARKER_U32 => (4, 0x1_0000),
        MARKER_U64 => (8, 0x1_0000_0000),
        small => return Ok((small as u64, 1)),
    };

    let body = bytes.get(1..1 + width).ok_or(CodecError::Truncated {
        needed: 1 + width,
        available: bytes.len(),
    })?;
    let value = body.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);

    if value < min {
        return Err(CodecError::NonMinimalVarint { value, marker });
    }
    Ok((value, 1 + width))
}
