//! Sequential reader over wire bytes.

use crate::{decode_varint, CodecError};

/// Cursor that consumes big-endian fields and varints from a byte slice.
///
/// Every read either advances past a complete field or fails with
/// `CodecError::Truncated`, leaving the position unchanged.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Start reading at the beginning of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Everything consumed so far.
    pub fn consumed(&self) -> &'a [u8] {
        &self.bytes[..self.pos]
    }

    /// Everything not yet consumed, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self.pos.checked_add(len).ok_or(CodecError::Truncated {
            needed: len,
            available: self.remaining(),
        })?;
        let slice = self.bytes.get(self.pos..end).ok_or(CodecError::Truncated {
            needed: len,
            available: self.remaining(),
        })?;
        self.pos = end;
        Ok(slice)
    }

    /// Read a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let slice = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.read_array::<4>().map(u32::from_be_bytes)
    }

    /// Read a big-endian u64.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        self.read_array::<8>().map(u64::from_be_bytes)
    }

    /// Read a varint.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let (value, used) = decode_varint(self.rest())?;
        self.pos += used;
        Ok(value)
    }

    /// Read a varint length followed by that many bytes.
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let start = self.pos;
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| CodecError::Truncated {
            needed: usize::MAX,
            available: self.remaining(),
        })?;
        match self.read_bytes(len) {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Consume and return all remaining bytes.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = self.rest();
        self.pos = self.bytes.len();
        rest
    }
}
