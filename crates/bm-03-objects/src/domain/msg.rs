//! # Msg Objects
//!
//! The plaintext carried inside a msg object's ECIES ciphertext:
//!
//! ```text
//! msg_version(varint) ‖ sender_version(varint) ‖ sender_stream(varint)
//!   ‖ bitfield(4) ‖ signing(64) ‖ encryption(64)
//!   ‖ [sender_version ≥ 3: ntpb(varint) ‖ extra(varint)]
//!   ‖ destination_ripe(20) ‖ encoding(varint)
//!   ‖ msg_len(varint) ‖ msg ‖ ack_len(varint) ‖ ack
//!   ‖ sig_len(varint) ‖ sig
//! ```
//!
//! The signature covers the envelope without nonce followed by every
//! plaintext byte before `sig_len`.

use crate::domain::encoding::{MessageEncoding, MessageText};
use crate::domain::envelope::{ObjectHeader, ObjectType, RawObject};
use crate::error::{ObjectError, Result};
use bm_01_address::{ripe_from_keys, Identity, NetworkAddress};
use bm_02_pow::PowParameters;
use shared_codec::{encode_varint, WireReader};
use shared_crypto::{ecdsa, ecies, PublicKey};
use shared_types::{BehaviourBitfield, Ripe};
use tracing::debug;

/// Version of the plaintext layout.
pub const MSG_PLAINTEXT_VERSION: u64 = 1;

/// Object version of msg envelopes.
pub const MSG_OBJECT_VERSION: u64 = 1;

/// Decrypted msg content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnencryptedMsg {
    /// Plaintext layout version.
    pub message_version: u64,
    /// Sender address version.
    pub sender_version: u64,
    /// Sender stream.
    pub sender_stream: u64,
    /// Sender behaviour.
    pub behaviour: BehaviourBitfield,
    /// Sender signing key.
    pub signing_key: PublicKey,
    /// Sender encryption key.
    pub encryption_key: PublicKey,
    /// Difficulty the sender demands (sender version ≥ 3).
    pub pow: Option<PowParameters>,
    /// Ripe of the recipient.
    pub destination_ripe: Ripe,
    /// Encoding id of `message`.
    pub encoding: u64,
    /// Encoded text.
    pub message: Vec<u8>,
    /// Network-framed ack object for the recipient to publish.
    pub ack: Vec<u8>,
    /// Signature.
    pub signature: Vec<u8>,
}

impl UnencryptedMsg {
    /// Unsigned msg from `sender` to `destination_ripe`.
    pub fn new(
        sender: &Identity,
        behaviour: BehaviourBitfield,
        pow: PowParameters,
        destination_ripe: Ripe,
        text: &MessageText,
        encoding: MessageEncoding,
        ack: Vec<u8>,
    ) -> Self {
        let address = sender.address();
        Self {
            message_version: MSG_PLAINTEXT_VERSION,
            sender_version: address.version(),
            sender_stream: address.stream(),
            behaviour,
            signing_key: *sender.signing().public_key(),
            encryption_key: *sender.encryption().public_key(),
            pow: (address.version() >= 3).then_some(pow),
            destination_ripe,
            encoding: encoding.id(),
            message: text.encode(encoding),
            ack,
            signature: Vec::new(),
        }
    }

    /// Every field up to and excluding the signature length.
    pub fn encode_unsigned(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(200 + self.message.len() + self.ack.len());
        out.extend_from_slice(&encode_varint(self.message_version));
        out.extend_from_slice(&encode_varint(self.sender_version));
        out.extend_from_slice(&encode_varint(self.sender_stream));
        out.extend_from_slice(&self.behaviour.to_be_bytes());
        out.extend_from_slice(&self.signing_key.to_bytes());
        out.extend_from_slice(&self.encryption_key.to_bytes());
        if self.sender_version >= 3 {
            let pow = self.pow.unwrap_or(PowParameters::new(
                bm_02_pow::NETWORK_NONCE_TRIALS_PER_BYTE,
                bm_02_pow::NETWORK_EXTRA_BYTES,
            ));
            out.extend_from_slice(&encode_varint(pow.nonce_trials_per_byte));
            out.extend_from_slice(&encode_varint(pow.extra_bytes));
        }
        out.extend_from_slice(&self.destination_ripe);
        out.extend_from_slice(&encode_varint(self.encoding));
        out.extend_from_slice(&encode_varint(self.message.len() as u64));
        out.extend_from_slice(&self.message);
        out.extend_from_slice(&encode_varint(self.ack.len() as u64));
        out.extend_from_slice(&self.ack);
        out
    }

    /// Full plaintext including the signature.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = self.encode_unsigned();
        out.extend_from_slice(&encode_varint(self.signature.len() as u64));
        out.extend_from_slice(&self.signature);
        out
    }

    /// Parse a plaintext; also returns the length of the signed part.
    pub fn decode(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut reader = WireReader::new(bytes);
        let message_version = reader.read_varint()?;
        let sender_version = reader.read_varint()?;
        let sender_stream = reader.read_varint()?;
        let behaviour = BehaviourBitfield(reader.read_u32()?);
        let signing_key = PublicKey::from_bytes(reader.read_bytes(64)?)?;
        let encryption_key = PublicKey::from_bytes(reader.read_bytes(64)?)?;
        let pow = if sender_version >= 3 {
            Some(PowParameters::new(reader.read_varint()?, reader.read_varint()?))
        } else {
            None
        };
        let destination_ripe: Ripe = reader.read_array()?;
        let encoding = reader.read_varint()?;
        let message = reader.read_var_bytes()?.to_vec();
        let ack = reader.read_var_bytes()?.to_vec();
        let signed_length = reader.position();
        let signature = reader.read_var_bytes()?.to_vec();

        Ok((
            Self {
                message_version,
                sender_version,
                sender_stream,
                behaviour,
                signing_key,
                encryption_key,
                pow,
                destination_ripe,
                encoding,
                message,
                ack,
                signature,
            },
            signed_length,
        ))
    }

    /// Sign for the given envelope.
    pub fn sign(&mut self, header: &ObjectHeader, sender: &Identity) {
        let data = signed_data(&header.encode(), &self.encode_unsigned());
        self.signature = ecdsa::sign(sender.signing().private_key(), &data);
    }

    /// Sender address implied by the embedded keys.
    pub fn sender_address(&self) -> Result<NetworkAddress> {
        let ripe = ripe_from_keys(&self.signing_key, &self.encryption_key);
        Ok(NetworkAddress::new(
            self.sender_version,
            self.sender_stream,
            ripe,
        )?)
    }

    /// Decoded subject and body.
    pub fn text(&self) -> MessageText {
        MessageText::decode(self.encoding, &self.message)
    }
}

fn signed_data(header: &[u8], unsigned: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(header.len() + unsigned.len());
    data.extend_from_slice(header);
    data.extend_from_slice(unsigned);
    data
}

/// Sign `msg`, encrypt it to `recipient_key` and return the object
/// without its nonce.
pub fn msg_body(
    msg: &mut UnencryptedMsg,
    sender: &Identity,
    recipient_key: &PublicKey,
    stream: u64,
    expiration: u64,
) -> Result<Vec<u8>> {
    let header = ObjectHeader::new(ObjectType::Msg, MSG_OBJECT_VERSION, stream, expiration);
    msg.sign(&header, sender);
    let ciphertext = ecies::encrypt(recipient_key, &msg.encode())?;
    Ok(header.with_payload(&ciphertext))
}

/// A msg that decrypted and verified under one of our identities.
#[derive(Debug, Clone)]
pub struct ReceivedMsg {
    /// Index of the identity that decrypted it.
    pub recipient: usize,
    /// Sender address derived from the embedded keys.
    pub sender: NetworkAddress,
    /// Decrypted content.
    pub msg: UnencryptedMsg,
}

/// Try every identity in turn.
///
/// # Errors
///
/// - `NotForMe` when no identity can open the payload
/// - `DestinationMismatch` when it opens but names another recipient
/// - `InvalidSignature` when the sender's signature does not verify
/// - `Crypto`/`Codec` when the ciphertext itself is malformed
pub fn decrypt_msg(raw: &RawObject<'_>, identities: &[Identity]) -> Result<ReceivedMsg> {
    raw.expect_type(ObjectType::Msg)?;

    for (index, identity) in identities.iter().enumerate() {
        let plaintext = match ecies::decrypt(identity.encryption().private_key(), raw.payload()) {
            Ok(plaintext) => plaintext,
            Err(e) if e.is_not_for_me() => {
                debug!(address = %identity.address(), "msg not for this identity");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let (msg, signed_length) = UnencryptedMsg::decode(&plaintext)?;
        if msg.destination_ripe != *identity.address().ripe() {
            return Err(ObjectError::DestinationMismatch);
        }
        let data = signed_data(raw.header_bytes(), &plaintext[..signed_length]);
        ecdsa::verify(&msg.signing_key, &data, &msg.signature)
            .map_err(|_| ObjectError::InvalidSignature)?;

        let sender = msg.sender_address()?;
        debug!(%sender, recipient = %identity.address(), "msg decrypted");
        return Ok(ReceivedMsg {
            recipient: index,
            sender,
            msg,
        });
    }
    Err(ObjectError::NotForMe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::attach_nonce;
    use bm_01_address::AddressGenerator;

    const EXPIRATION: u64 = 1_700_000_000;

    fn identity() -> Identity {
        AddressGenerator::default().generate().unwrap()
    }

    fn unsigned(alice: &Identity, bob: &Identity) -> UnencryptedMsg {
        UnencryptedMsg::new(
            alice,
            BehaviourBitfield::standard(),
            PowParameters::new(1000, 1000),
            *bob.address().ripe(),
            &MessageText::new("Hello", "How are you?"),
            MessageEncoding::Simple,
            vec![0xAC; 40],
        )
    }

    fn object(alice: &Identity, bob: &Identity) -> Vec<u8> {
        let mut msg = unsigned(alice, bob);
        let body = msg_body(&mut msg, alice, bob.encryption().public_key(), 1, EXPIRATION).unwrap();
        attach_nonce(1, &body)
    }

    #[test]
    fn test_plaintext_decode_inverts_encode() {
        let alice = identity();
        let bob = identity();
        let mut msg = unsigned(&alice, &bob);
        msg.signature = vec![1, 2, 3];
        let encoded = msg.encode();

        let (decoded, signed_length) = UnencryptedMsg::decode(&encoded).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(signed_length, msg.encode_unsigned().len());
    }

    #[test]
    fn test_recipient_decrypts_and_verifies() {
        let alice = identity();
        let bob = identity();
        let carol = identity();
        let bytes = object(&alice, &bob);
        let raw = RawObject::decode(&bytes).unwrap();

        let received = decrypt_msg(&raw, &[carol, bob.clone()]).unwrap();
        assert_eq!(received.recipient, 1);
        assert_eq!(received.sender, *alice.address());
        assert_eq!(received.msg.text(), MessageText::new("Hello", "How are you?"));
        assert_eq!(received.msg.ack, vec![0xAC; 40]);
        assert!(received.msg.behaviour.sends_acks());
    }

    #[test]
    fn test_no_identity_can_decrypt() {
        let alice = identity();
        let bob = identity();
        let bytes = object(&alice, &bob);
        let raw = RawObject::decode(&bytes).unwrap();

        let err = decrypt_msg(&raw, &[alice.clone(), identity()]).unwrap_err();
        assert!(matches!(err, ObjectError::NotForMe));
        assert!(decrypt_msg(&raw, &[]).unwrap_err().is_not_for_me());
    }

    #[test]
    fn test_forwarded_msg_rejected() {
        let alice = identity();
        let bob = identity();
        let carol = identity();
        // Signed for Bob but encrypted to Carol.
        let mut msg = unsigned(&alice, &bob);
        let body =
            msg_body(&mut msg, &alice, carol.encryption().public_key(), 1, EXPIRATION).unwrap();
        let bytes = attach_nonce(0, &body);
        let raw = RawObject::decode(&bytes).unwrap();

        assert!(matches!(
            decrypt_msg(&raw, &[carol]),
            Err(ObjectError::DestinationMismatch)
        ));
    }

    #[test]
    fn test_header_change_breaks_signature() {
        let alice = identity();
        let bob = identity();
        let mut bytes = object(&alice, &bob);
        // Move the expiration; the ciphertext still opens.
        bytes[15] ^= 1;
        let raw = RawObject::decode(&bytes).unwrap();

        assert!(matches!(
            decrypt_msg(&raw, &[bob]),
            Err(ObjectError::InvalidSignature)
        ));
    }

    #[test]
    fn test_forged_signature_rejected() {
        let alice = identity();
        let bob = identity();
        let mallory = identity();
        let mut msg = unsigned(&alice, &bob);
        let header = ObjectHeader::new(ObjectType::Msg, 1, 1, EXPIRATION);
        msg.sign(&header, &mallory);
        let ciphertext = ecies::encrypt(bob.encryption().public_key(), &msg.encode()).unwrap();
        let bytes = attach_nonce(0, &header.with_payload(&ciphertext));
        let raw = RawObject::decode(&bytes).unwrap();

        assert!(matches!(
            decrypt_msg(&raw, &[bob]),
            Err(ObjectError::InvalidSignature)
        ));
    }

    #[test]
    fn test_non_msg_object_rejected() {
        let bytes = attach_nonce(
            0,
            &ObjectHeader::new(ObjectType::Pubkey, 4, 1, EXPIRATION).with_payload(&[0u8; 50]),
        );
        let raw = RawObject::decode(&bytes).unwrap();
        assert!(matches!(
            decrypt_msg(&raw, &[]),
            Err(ObjectError::UnexpectedObjectType { .. })
        ));
    }
}
