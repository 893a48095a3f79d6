//! # Address-Derived Material
//!
//! | Output | Construction |
//! |--------|--------------|
//! | ripe | RIPEMD160(SHA-512(signing65 ‖ encryption65)) |
//! | encryption key | SHA-512²(hash input)[..32] |
//! | tag | SHA-512²(hash input)[32..] |
//! | message tag | SHA-512²(hash input ‖ u64 day start)[..32] |
//!
//! The encryption key decrypts v4 pubkeys; the tag is the public lookup
//! handle for them. Message tags rotate daily.

use crate::domain::address::NetworkAddress;
use crate::error::Result;
use shared_crypto::{double_sha512, hash160, PrivateKey, PublicKey};
use shared_types::{Ripe, Tag, Timestamp};

/// Seconds per tag rotation period.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Ripe hash of a signing/encryption key pair.
pub fn ripe_from_keys(signing: &PublicKey, encryption: &PublicKey) -> Ripe {
    let mut data = Vec::with_capacity(130);
    data.extend_from_slice(&signing.to_tagged_bytes());
    data.extend_from_slice(&encryption.to_tagged_bytes());
    hash160(&data)
}

fn address_digest(address: &NetworkAddress) -> [u8; 64] {
    double_sha512(&address.hash_input())
}

/// Private key that decrypts v4 pubkeys of `address`.
pub fn encryption_key_for(address: &NetworkAddress) -> Result<PrivateKey> {
    Ok(PrivateKey::from_bytes(&address_digest(address)[..32])?)
}

/// Public lookup tag of `address`.
pub fn tag_for(address: &NetworkAddress) -> Tag {
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&address_digest(address)[32..]);
    tag
}

/// Validate `address` and derive its pubkey decryption key.
pub fn encryption_key(address: &str) -> Result<PrivateKey> {
    encryption_key_for(&NetworkAddress::parse(address)?)
}

/// Validate `address` and derive its tag.
pub fn tag(address: &str) -> Result<Tag> {
    NetworkAddress::parse(address).map(|a| tag_for(&a))
}

/// Start of the day containing `time`.
pub fn day_start(time: Timestamp) -> Timestamp {
    time - time % SECONDS_PER_DAY
}

/// Tag for messages to `address` during the day containing `time`.
pub fn message_tag_for(address: &NetworkAddress, time: Timestamp) -> Tag {
    let mut data = address.hash_input();
    data.extend_from_slice(&day_start(time).to_be_bytes());
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&double_sha512(&data)[..32]);
    tag
}

/// Validate `address` and derive the message tag for `time`.
pub fn message_tag(address: &str, time: Timestamp) -> Result<Tag> {
    NetworkAddress::parse(address).map(|a| message_tag_for(&a, time))
}

/// Message tags for every day from the one containing `since` through the
/// one containing `now`.
pub fn message_tags_since(address: &str, since: Timestamp, now: Timestamp) -> Result<Vec<Tag>> {
    let address = NetworkAddress::parse(address)?;
    let first = day_start(since);
    let last = day_start(now);
    if first > last {
        return Ok(Vec::new());
    }
    Ok((first..=last)
        .step_by(SECONDS_PER_DAY as usize)
        .map(|day| message_tag_for(&address, day))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::KeyPair;

    const KNOWN: &str = "BM-NBniqBpDRZHLx7rVWyyrEf1XmPgSiSrr";

    #[test]
    fn test_known_encryption_key_and_tag() {
        let key = encryption_key(KNOWN).unwrap();
        assert_eq!(
            hex::encode(key.to_bytes()),
            "45a1f740c854c74bd605db7519a1a39d32737d0f18bae91e59165e53dc2f5d8b"
        );
        assert_eq!(
            hex::encode(tag(KNOWN).unwrap()),
            "d1ca03fb84a3c93d882be671983980ec5207c218c4389ee0c59d4a227c6ffcb5"
        );
    }

    #[test]
    fn test_known_message_tag() {
        let tag = message_tag(KNOWN, 1_700_000_000).unwrap();
        assert_eq!(
            hex::encode(tag),
            "7985aa9ce61782b54d935681c8b5626a9e994a0061a49e29e67dfa1df10ac9b9"
        );
        // Any time within the same day yields the same tag.
        assert_eq!(message_tag(KNOWN, 1_699_920_000).unwrap(), tag);
        assert_ne!(message_tag(KNOWN, 1_699_919_999).unwrap(), tag);
    }

    #[test]
    fn test_message_tags_since_enumerates_days() {
        let now = 1_700_000_000;
        let tags = message_tags_since(KNOWN, now - 3 * SECONDS_PER_DAY, now).unwrap();
        assert_eq!(tags.len(), 4);
        assert_eq!(tags[3], message_tag(KNOWN, now).unwrap());
        assert!(message_tags_since(KNOWN, now, now - SECONDS_PER_DAY)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_derivations_reject_bad_address() {
        assert!(tag("BM-nope").is_err());
        assert!(encryption_key("").is_err());
        assert!(message_tags_since("not an address at all, clearly", 0, 1).is_err());
    }

    #[test]
    fn test_ripe_depends_on_key_order() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(
            ripe_from_keys(a.public_key(), b.public_key()),
            ripe_from_keys(b.public_key(), a.public_key())
        );
    }
}
