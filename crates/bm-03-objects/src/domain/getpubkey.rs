//! Getpubkey requests
//!
//! The payload is the lookup identifier only: the ripe hash for address
//! versions up to 3, the address tag from version 4 on. The object version
//! equals the address version.

use crate::domain::envelope::{ObjectHeader, ObjectType, RawObject};
use crate::error::{ObjectError, Result};
use bm_01_address::{tag_for, NetworkAddress};
use shared_codec::WireReader;
use shared_types::{Ripe, Tag, Timestamp};

/// What a getpubkey asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PubkeyIdentifier {
    /// Ripe hash (address version ≤ 3).
    Ripe(Ripe),
    /// Address tag (address version ≥ 4).
    Tag(Tag),
}

impl PubkeyIdentifier {
    /// Identifier used to look up the pubkey of `address`.
    pub fn for_address(address: &NetworkAddress) -> Self {
        if address.version() >= 4 {
            Self::Tag(tag_for(address))
        } else {
            Self::Ripe(*address.ripe())
        }
    }

    /// Raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Ripe(ripe) => ripe,
            Self::Tag(tag) => tag,
        }
    }
}

/// Getpubkey object without its nonce.
pub fn getpubkey_body(address: &NetworkAddress, expiration: Timestamp) -> Vec<u8> {
    ObjectHeader::new(
        ObjectType::GetPubkey,
        address.version(),
        address.stream(),
        expiration,
    )
    .with_payload(PubkeyIdentifier::for_address(address).as_bytes())
}

/// Read the identifier of a getpubkey object.
pub fn parse_getpubkey(raw: &RawObject<'_>) -> Result<PubkeyIdentifier> {
    raw.expect_type(ObjectType::GetPubkey)?;
    let mut reader = WireReader::new(raw.payload());
    match raw.header.version {
        1..=3 => Ok(PubkeyIdentifier::Ripe(reader.read_array()?)),
        4 => Ok(PubkeyIdentifier::Tag(reader.read_array()?)),
        version => Err(ObjectError::UnsupportedVersion {
            object_type: ObjectType::GetPubkey.name(),
            version,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::attach_nonce;

    const V4: &str = "BM-NBniqBpDRZHLx7rVWyyrEf1XmPgSiSrr";

    #[test]
    fn test_v4_request_carries_tag() {
        let address = NetworkAddress::parse(V4).unwrap();
        let object = attach_nonce(0, &getpubkey_body(&address, 1_700_000_000));
        let raw = RawObject::decode(&object).unwrap();

        assert_eq!(raw.header.version, 4);
        assert_eq!(raw.payload().len(), 32);
        assert_eq!(
            parse_getpubkey(&raw).unwrap(),
            PubkeyIdentifier::Tag(tag_for(&address))
        );
    }

    #[test]
    fn test_v3_request_carries_ripe() {
        let mut ripe = [0u8; 20];
        ripe[3..].copy_from_slice(&[9u8; 17]);
        let address = NetworkAddress::new(3, 1, ripe).unwrap();
        let object = attach_nonce(0, &getpubkey_body(&address, 1_700_000_000));
        let raw = RawObject::decode(&object).unwrap();

        assert_eq!(parse_getpubkey(&raw).unwrap(), PubkeyIdentifier::Ripe(ripe));
    }

    #[test]
    fn test_v1_request_carries_ripe() {
        let ripe = [5u8; 20];
        let address = NetworkAddress::new(1, 1, ripe).unwrap();
        let object = attach_nonce(0, &getpubkey_body(&address, 1_700_000_000));
        let raw = RawObject::decode(&object).unwrap();

        assert_eq!(raw.header.version, 1);
        assert_eq!(parse_getpubkey(&raw).unwrap(), PubkeyIdentifier::Ripe(ripe));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let object = attach_nonce(
            0,
            &ObjectHeader::new(ObjectType::GetPubkey, 5, 1, 0).with_payload(&[1u8; 32]),
        );
        let raw = RawObject::decode(&object).unwrap();
        assert!(matches!(
            parse_getpubkey(&raw),
            Err(ObjectError::UnsupportedVersion { version: 5, .. })
        ));
    }

    #[test]
    fn test_truncated_identifier() {
        let object = attach_nonce(
            0,
            &ObjectHeader::new(ObjectType::GetPubkey, 4, 1, 0).with_payload(&[1u8; 31]),
        );
        let raw = RawObject::decode(&object).unwrap();
        assert!(matches!(parse_getpubkey(&raw), Err(ObjectError::Codec(_))));
    }
}
