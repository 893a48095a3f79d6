//! # Pubkey Objects
//!
//! ```text
//! v1, v2:  bitfield(4) ‖ signing(64) ‖ encryption(64)
//! v3:  v2 fields ‖ ntpb(varint) ‖ extra(varint) ‖ siglen(varint) ‖ sig
//! v4:  tag(32) ‖ ECIES(v3 fields)
//! ```
//!
//! Signatures cover the envelope without nonce, the tag for v4, and every
//! field up to the signature length. A v4 payload is encrypted to the key
//! derived from the address, so only someone who knows the address can
//! read it.

use crate::domain::envelope::{ObjectHeader, ObjectType, RawObject};
use crate::error::{ObjectError, Result};
use bm_01_address::{encryption_key_for, ripe_from_keys, tag_for, Identity, NetworkAddress};
use bm_02_pow::{PowParameters, NETWORK_EXTRA_BYTES, NETWORK_NONCE_TRIALS_PER_BYTE};
use shared_codec::{encode_varint, WireReader};
use shared_crypto::{ecdsa, ecies, PublicKey};
use shared_types::{BehaviourBitfield, PubkeyRecord, Ripe, Tag};
use tracing::debug;

/// Lowest pubkey version built or parsed.
pub const MIN_PUBKEY_VERSION: u64 = 1;

/// A verified pubkey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pubkey {
    /// Envelope it arrived in.
    pub header: ObjectHeader,
    /// POW nonce of the object.
    pub nonce: u64,
    /// Advertised behaviour.
    pub behaviour: BehaviourBitfield,
    /// Public signing key.
    pub signing_key: PublicKey,
    /// Public encryption key.
    pub encryption_key: PublicKey,
    /// Advertised difficulty (v3 and later).
    pub pow: Option<PowParameters>,
    /// Signature (empty before v3).
    pub signature: Vec<u8>,
    /// Ripe of the key pair.
    pub ripe: Ripe,
    /// Tag of the owning address.
    pub tag: Tag,
}

impl Pubkey {
    /// Record for a correspondent's pubkey.
    pub fn to_record(&self) -> PubkeyRecord {
        let pow = self.pow.unwrap_or(PowParameters::new(
            NETWORK_NONCE_TRIALS_PER_BYTE,
            NETWORK_EXTRA_BYTES,
        ));
        PubkeyRecord {
            id: None,
            belongs_to_me: false,
            ripe: self.ripe,
            tag: self.tag,
            address_version: self.header.version,
            stream: self.header.stream,
            behaviour: self.behaviour,
            signing_key: self.signing_key.to_bytes(),
            encryption_key: self.encryption_key.to_bytes(),
            nonce_trials_per_byte: pow.nonce_trials_per_byte,
            extra_bytes: pow.extra_bytes,
            pow_nonce: self.nonce,
            expiration: self.header.expiration,
            signature: self.signature.clone(),
        }
    }
}

fn encode_fields(
    behaviour: BehaviourBitfield,
    signing: &PublicKey,
    encryption: &PublicKey,
    pow: Option<PowParameters>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 64 + 64 + 6);
    out.extend_from_slice(&behaviour.to_be_bytes());
    out.extend_from_slice(&signing.to_bytes());
    out.extend_from_slice(&encryption.to_bytes());
    if let Some(pow) = pow {
        out.extend_from_slice(&encode_varint(pow.nonce_trials_per_byte));
        out.extend_from_slice(&encode_varint(pow.extra_bytes));
    }
    out
}

/// Pubkey object for `identity`, without the nonce.
///
/// `pow` is the difficulty advertised to senders (v3 and later).
pub fn pubkey_body(
    identity: &Identity,
    behaviour: BehaviourBitfield,
    pow: PowParameters,
    expiration: u64,
) -> Result<Vec<u8>> {
    let address = identity.address();
    let version = address.version();
    if version < MIN_PUBKEY_VERSION {
        return Err(ObjectError::UnsupportedVersion {
            object_type: ObjectType::Pubkey.name(),
            version,
        });
    }
    let header = ObjectHeader::new(ObjectType::Pubkey, version, address.stream(), expiration);
    let fields = encode_fields(
        behaviour,
        identity.signing().public_key(),
        identity.encryption().public_key(),
        (version >= 3).then_some(pow),
    );
    if version <= 2 {
        return Ok(header.with_payload(&fields));
    }

    let tag = (version >= 4).then(|| tag_for(address));
    let mut signed = header.encode();
    if let Some(tag) = &tag {
        signed.extend_from_slice(tag);
    }
    signed.extend_from_slice(&fields);
    let signature = ecdsa::sign(identity.signing().private_key(), &signed);

    let mut sealed = fields;
    sealed.extend_from_slice(&encode_varint(signature.len() as u64));
    sealed.extend_from_slice(&signature);

    match tag {
        None => Ok(header.with_payload(&sealed)),
        Some(tag) => {
            let key = encryption_key_for(address)?;
            let mut payload = tag.to_vec();
            payload.extend_from_slice(&ecies::encrypt(&key.public_key(), &sealed)?);
            Ok(header.with_payload(&payload))
        }
    }
}

struct Fields {
    behaviour: BehaviourBitfield,
    signing_key: PublicKey,
    encryption_key: PublicKey,
    pow: Option<PowParameters>,
    signature: Vec<u8>,
}

/// Read the fields; `prefix` is what the signature covers ahead of them.
fn read_fields(body: &[u8], version: u64, prefix: &[u8]) -> Result<Fields> {
    let mut reader = WireReader::new(body);
    let behaviour = BehaviourBitfield(reader.read_u32()?);
    let signing_key = PublicKey::from_bytes(reader.read_bytes(64)?)?;
    let encryption_key = PublicKey::from_bytes(reader.read_bytes(64)?)?;
    if version < 3 {
        return Ok(Fields {
            behaviour,
            signing_key,
            encryption_key,
            pow: None,
            signature: Vec::new(),
        });
    }

    let pow = PowParameters::new(reader.read_varint()?, reader.read_varint()?);
    let mut signed = prefix.to_vec();
    signed.extend_from_slice(reader.consumed());
    let signature = reader.read_var_bytes()?.to_vec();
    ecdsa::verify(&signing_key, &signed, &signature).map_err(|_| ObjectError::InvalidSignature)?;

    Ok(Fields {
        behaviour,
        signing_key,
        encryption_key,
        pow: Some(pow),
        signature,
    })
}

/// Decode, decrypt and verify the pubkey of `address`.
///
/// # Errors
///
/// - `TagMismatch` when a v4 object is for another address
/// - `Crypto(MacMismatch)` when the v4 payload does not open with the
///   address-derived key
/// - `InvalidSignature`, `RipeMismatch` when the content is not authentic
pub fn parse_pubkey(raw: &RawObject<'_>, address: &NetworkAddress) -> Result<Pubkey> {
    raw.expect_type(ObjectType::Pubkey)?;
    let version = raw.header.version;
    if !(MIN_PUBKEY_VERSION..=4).contains(&version) || version != address.version() {
        return Err(ObjectError::UnsupportedVersion {
            object_type: ObjectType::Pubkey.name(),
            version,
        });
    }
    let expected_tag = tag_for(address);

    let fields = if version >= 4 {
        let mut reader = WireReader::new(raw.payload());
        let tag: Tag = reader.read_array()?;
        if tag != expected_tag {
            return Err(ObjectError::TagMismatch);
        }
        let plaintext = ecies::decrypt(&encryption_key_for(address)?, reader.read_rest())?;
        let mut prefix = raw.header_bytes().to_vec();
        prefix.extend_from_slice(&tag);
        read_fields(&plaintext, version, &prefix)?
    } else {
        read_fields(raw.payload(), version, raw.header_bytes())?
    };

    let ripe = ripe_from_keys(&fields.signing_key, &fields.encryption_key);
    if ripe != *address.ripe() {
        return Err(ObjectError::RipeMismatch);
    }
    debug!(%address, version, "Pubkey verified");

    Ok(Pubkey {
        header: raw.header,
        nonce: raw.nonce,
        behaviour: fields.behaviour,
        signing_key: fields.signing_key,
        encryption_key: fields.encryption_key,
        pow: fields.pow,
        signature: fields.signature,
        ripe,
        tag: expected_tag,
    })
}
