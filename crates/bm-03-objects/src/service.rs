//! Object codec service
//!
//! Applies lifetime rules and proof of work to the wire formats in
//! [`crate::domain`]. Everything takes `now` explicitly.

use crate::config::ObjectConfig;
use crate::domain::{
    ack_body, attach_nonce, decrypt_msg, frame, getpubkey_body, is_ack, msg_body, parse_pubkey,
    pubkey_body, MessageEncoding, MessageText, ObjectType, Pubkey, RawObject, ReceivedMsg,
    UnencryptedMsg, ACK_DATA_LENGTH, DEFAULT_STREAM, LEGACY_CUTOVER, MAX_OBJECT_VERSION, MAX_TTL,
    TTL_GRACE,
};
use crate::error::{ObjectError, Result};
use bm_01_address::{Identity, NetworkAddress};
use bm_02_pow::{PowEngine, PowParameters};
use rand::RngCore;
use shared_crypto::PublicKey;
use shared_types::{BehaviourBitfield, PubkeyRecord, Timestamp};
use tracing::{debug, instrument};

/// An object ready for dissemination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedObject {
    /// Object bytes (nonce is zero when `pow_done` is false).
    pub bytes: Vec<u8>,
    /// Expiration time written in the envelope.
    pub expiration: Timestamp,
    /// Difficulty the nonce must satisfy.
    pub params: PowParameters,
    /// True when the nonce was solved locally.
    pub pow_done: bool,
}

/// A freshly built ack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckObject {
    /// Random payload.
    pub data: [u8; ACK_DATA_LENGTH],
    /// Network-framed ack object, embedded in the msg.
    pub framed: Vec<u8>,
    /// True when the nonce was solved locally.
    pub pow_done: bool,
}

/// What a validated msg object turned out to be.
#[derive(Debug, Clone)]
pub enum IncomingMsg {
    /// 32-byte payload: an acknowledgment to match against awaited acks.
    Ack,
    /// A message for one of our identities.
    Message(ReceivedMsg),
}

/// Key material and difficulty needed to send to someone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Recipient address.
    pub address: NetworkAddress,
    /// Recipient's public encryption key.
    pub encryption_key: PublicKey,
    /// Difficulty the recipient advertises.
    pub pow: PowParameters,
    /// Recipient behaviour.
    pub behaviour: BehaviourBitfield,
}

impl Recipient {
    /// From a stored pubkey.
    pub fn from_record(record: &PubkeyRecord) -> Result<Self> {
        Ok(Self {
            address: NetworkAddress::new(record.address_version, record.stream, record.ripe)?,
            encryption_key: PublicKey::from_bytes(&record.encryption_key)?,
            pow: PowParameters::new(record.nonce_trials_per_byte, record.extra_bytes),
            behaviour: record.behaviour,
        })
    }
}

/// Builds and validates objects.
#[derive(Debug, Clone, Default)]
pub struct ObjectCodec {
    config: ObjectConfig,
    pow: PowEngine,
}

impl ObjectCodec {
    /// Create from configuration and a POW engine.
    pub fn new(config: ObjectConfig, pow: PowEngine) -> Self {
        Self { config, pow }
    }

    /// Active configuration.
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    /// Underlying POW engine.
    pub fn pow(&self) -> &PowEngine {
        &self.pow
    }

    /// Behaviour advertised for our identities.
    pub fn behaviour(&self) -> BehaviourBitfield {
        if self.config.request_acks {
            BehaviourBitfield::standard()
        } else {
            BehaviourBitfield::default()
        }
    }

    /// Decode an envelope and apply every network acceptance rule.
    ///
    /// # Errors
    ///
    /// `LegacyFormat`, `ExpiresTooFarAhead`, `Expired`,
    /// `UnsupportedStream`, `UnsupportedVersion` or `InsufficientPow`.
    pub fn parse<'a>(&self, bytes: &'a [u8], now: Timestamp) -> Result<RawObject<'a>> {
        let raw = RawObject::decode(bytes)?;
        let header = raw.header;

        if header.expiration < LEGACY_CUTOVER {
            return Err(ObjectError::LegacyFormat(header.expiration));
        }
        if header.expiration > now.saturating_add(MAX_TTL + TTL_GRACE) {
            return Err(ObjectError::ExpiresTooFarAhead {
                expiration: header.expiration,
                now,
            });
        }
        if header.expiration.saturating_add(TTL_GRACE) < now {
            return Err(ObjectError::Expired {
                expiration: header.expiration,
                now,
            });
        }
        if header.stream != DEFAULT_STREAM {
            return Err(ObjectError::UnsupportedStream(header.stream));
        }
        if !(1..=MAX_OBJECT_VERSION).contains(&header.version) {
            return Err(ObjectError::UnsupportedVersion {
                object_type: header.object_type.name(),
                version: header.version,
            });
        }
        if !self.pow.verify(bytes, self.pow.network_minimum(), now)? {
            return Err(ObjectError::InsufficientPow);
        }
        Ok(raw)
    }

    /// Add a nonce to `body`, solving it when local POW is enabled.
    pub fn seal(
        &self,
        body: &[u8],
        expiration: Timestamp,
        params: PowParameters,
        now: Timestamp,
    ) -> Result<SealedObject> {
        let (bytes, pow_done) = if self.pow.enabled() {
            (self.pow.seal(body, expiration, params, now)?, true)
        } else {
            (attach_nonce(0, body), false)
        };
        Ok(SealedObject {
            bytes,
            expiration,
            params,
            pow_done,
        })
    }

    /// Our pubkey object for `identity`.
    #[instrument(skip(self, identity), fields(address = %identity.address()))]
    pub fn build_pubkey(&self, identity: &Identity, now: Timestamp) -> Result<SealedObject> {
        let expiration = now + self.config.pubkey_ttl;
        let params = self.pow.network_minimum();
        let body = pubkey_body(identity, self.behaviour(), params, expiration)?;
        self.seal(&body, expiration, params, now)
    }

    /// Getpubkey request for `address`.
    #[instrument(skip_all, fields(address = %address))]
    pub fn build_getpubkey(&self, address: &NetworkAddress, now: Timestamp) -> Result<SealedObject> {
        let expiration = now + self.config.getpubkey_ttl;
        let body = getpubkey_body(address, expiration);
        self.seal(&body, expiration, self.pow.network_minimum(), now)
    }

    /// Random ack object, framed for embedding.
    pub fn build_ack(&self, stream: u64, expiration: Timestamp, now: Timestamp) -> Result<AckObject> {
        let mut data = [0u8; ACK_DATA_LENGTH];
        rand::thread_rng().fill_bytes(&mut data);
        let sealed = self.seal(
            &ack_body(&data, stream, expiration),
            expiration,
            self.pow.network_minimum(),
            now,
        )?;
        Ok(AckObject {
            data,
            framed: frame(&sealed.bytes)?,
            pow_done: sealed.pow_done,
        })
    }

    /// Signed, encrypted msg from `sender` to `recipient`.
    #[instrument(skip_all, fields(from = %sender.address(), to = %recipient.address))]
    pub fn build_msg(
        &self,
        sender: &Identity,
        recipient: &Recipient,
        text: &MessageText,
        ack: Vec<u8>,
        expiration: Timestamp,
        now: Timestamp,
    ) -> Result<SealedObject> {
        let mut msg = UnencryptedMsg::new(
            sender,
            self.behaviour(),
            self.pow.network_minimum(),
            *recipient.address.ripe(),
            text,
            MessageEncoding::Simple,
            ack,
        );
        let body = msg_body(
            &mut msg,
            sender,
            &recipient.encryption_key,
            recipient.address.stream(),
            expiration,
        )?;
        let params = self.pow.effective_parameters(Some(recipient.pow));
        debug!(?params, len = body.len(), "msg encrypted");
        self.seal(&body, expiration, params, now)
    }

    /// Validate and verify a pubkey object for `address`.
    pub fn read_pubkey(
        &self,
        bytes: &[u8],
        address: &NetworkAddress,
        now: Timestamp,
    ) -> Result<Pubkey> {
        let raw = self.parse(bytes, now)?;
        parse_pubkey(&raw, address)
    }

    /// Validate a msg object and classify it as ack or message.
    pub fn open_msg(
        &self,
        bytes: &[u8],
        identities: &[Identity],
        now: Timestamp,
    ) -> Result<IncomingMsg> {
        let raw = self.parse(bytes, now)?;
        raw.expect_type(ObjectType::Msg)?;
        if is_ack(&raw) {
            return Ok(IncomingMsg::Ack);
        }
        decrypt_msg(&raw, identities).map(IncomingMsg::Message)
    }
}
