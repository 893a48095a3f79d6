//! # Object Envelope
//!
//! ```text
//! nonce(8) ‖ expiration(8) ‖ type(4) ‖ version(varint) ‖ stream(varint) ‖ payload
//! ```
//!
//! Everything after the nonce is what the proof of work hashes, and the
//! bytes between the nonce and the payload prefix every signature.

use crate::error::{ObjectError, Result};
use shared_codec::{encode_varint, WireReader};
use shared_types::Timestamp;
use std::fmt;

/// Stream every object currently lives in.
pub const DEFAULT_STREAM: u64 = 1;

/// Longest lifetime the network accepts (28 days).
pub const MAX_TTL: u64 = 28 * 24 * 60 * 60;

/// Clock skew tolerated on both ends of the lifetime window (3 hours).
pub const TTL_GRACE: u64 = 3 * 60 * 60;

/// Objects expiring before this moment use the pre-upgrade layout.
pub const LEGACY_CUTOVER: Timestamp = 1_416_175_200;

/// Highest object version accepted by the generic parse.
pub const MAX_OBJECT_VERSION: u64 = 4;

/// Object type on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    /// Request for a pubkey.
    GetPubkey,
    /// Pubkey.
    Pubkey,
    /// Person-to-person message or ack.
    Msg,
    /// Broadcast (relayed, never decoded here).
    Broadcast,
}

impl ObjectType {
    /// Numeric wire value.
    pub fn as_u32(self) -> u32 {
        match self {
            Self::GetPubkey => 0,
            Self::Pubkey => 1,
            Self::Msg => 2,
            Self::Broadcast => 3,
        }
    }

    /// Parse the wire value.
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::GetPubkey),
            1 => Ok(Self::Pubkey),
            2 => Ok(Self::Msg),
            3 => Ok(Self::Broadcast),
            other => Err(ObjectError::UnknownObjectType(other)),
        }
    }

    /// Lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::GetPubkey => "getpubkey",
            Self::Pubkey => "pubkey",
            Self::Msg => "msg",
            Self::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Envelope fields after the nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectHeader {
    /// Expiration time.
    pub expiration: Timestamp,
    /// Object type.
    pub object_type: ObjectType,
    /// Object version.
    pub version: u64,
    /// Stream number.
    pub stream: u64,
}

impl ObjectHeader {
    /// Header for a new object.
    pub fn new(object_type: ObjectType, version: u64, stream: u64, expiration: Timestamp) -> Self {
        Self {
            expiration,
            object_type,
            version,
            stream,
        }
    }

    /// `expiration ‖ type ‖ varint(version) ‖ varint(stream)`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(14);
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.object_type.as_u32().to_be_bytes());
        out.extend_from_slice(&encode_varint(self.version));
        out.extend_from_slice(&encode_varint(self.stream));
        out
    }

    /// Header followed by `payload`, ready for POW.
    pub fn with_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = self.encode();
        out.extend_from_slice(payload);
        out
    }
}

/// A structurally decoded object borrowing its bytes.
#[derive(Debug, Clone, Copy)]
pub struct RawObject<'a> {
    /// POW nonce.
    pub nonce: u64,
    /// Envelope.
    pub header: ObjectHeader,
    bytes: &'a [u8],
    payload_offset: usize,
}

impl<'a> RawObject<'a> {
    /// Decode the envelope without semantic checks.
    pub fn decode(bytes: &'a [u8]) -> Result<Self> {
        let mut reader = WireReader::new(bytes);
        let nonce = reader.read_u64()?;
        let expiration = reader.read_u64()?;
        let object_type = ObjectType::from_u32(reader.read_u32()?)?;
        let version = reader.read_varint()?;
        let stream = reader.read_varint()?;
        Ok(Self {
            nonce,
            header: ObjectHeader {
                expiration,
                object_type,
                version,
                stream,
            },
            bytes,
            payload_offset: reader.position(),
        })
    }

    /// Whole object.
    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Everything after the nonce (the POW input).
    pub fn without_nonce(&self) -> &'a [u8] {
        &self.bytes[8..]
    }

    /// Envelope bytes between the nonce and the payload (signature prefix).
    pub fn header_bytes(&self) -> &'a [u8] {
        &self.bytes[8..self.payload_offset]
    }

    /// Type-specific payload.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[self.payload_offset..]
    }

    /// Fail unless the object has the given type.
    pub fn expect_type(&self, expected: ObjectType) -> Result<()> {
        if self.header.object_type == expected {
            Ok(())
        } else {
            Err(ObjectError::UnexpectedObjectType {
                expected: expected.name(),
                actual: self.header.object_type.name(),
            })
        }
    }
}

/// Prefix `payload` (header ‖ body) with a nonce.
pub fn attach_nonce(nonce: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&nonce.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Expiration time of an encoded object.
pub fn expiration_of(bytes: &[u8]) -> Result<Timestamp> {
    Ok(RawObject::decode(bytes)?.header.expiration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_header_layout() {
        let header = ObjectHeader::new(ObjectType::Msg, 1, 1, 0x0102_0304_0506_0708);
        assert_eq!(
            header.encode(),
            vec![1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 2, 1, 1]
        );
    }

    #[test]
    fn test_decode_splits_sections() {
        let header = ObjectHeader::new(ObjectType::GetPubkey, 4, 1, 1_700_000_000);
        let object = attach_nonce(99, &header.with_payload(&[0xAA; 32]));
        let raw = RawObject::decode(&object).unwrap();

        assert_eq!(raw.nonce, 99);
        assert_eq!(raw.header, header);
        assert_eq!(raw.header_bytes(), &header.encode()[..]);
        assert_eq!(raw.payload(), &[0xAA; 32]);
        assert_eq!(raw.without_nonce().len(), object.len() - 8);
        assert!(raw.expect_type(ObjectType::GetPubkey).is_ok());
        assert!(matches!(
            raw.expect_type(ObjectType::Msg),
            Err(ObjectError::UnexpectedObjectType { .. })
        ));
        assert_eq!(expiration_of(&object).unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut object = attach_nonce(0, &ObjectHeader::new(ObjectType::Msg, 1, 1, 0).encode());
        object[19] = 9;
        assert!(matches!(
            RawObject::decode(&object),
            Err(ObjectError::UnknownObjectType(9))
        ));
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        assert!(matches!(
            RawObject::decode(&[0u8; 19]),
            Err(ObjectError::Codec(_))
        ));
    }

    proptest! {
        #[test]
        fn proptest_decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            if let Ok(raw) = RawObject::decode(&bytes) {
                prop_assert_eq!(
                    raw.header_bytes().len() + raw.payload().len() + 8,
                    bytes.len()
                );
            }
        }
    }
}
