//! # Identity Generation
//!
//! A fixed signing key is paired with fresh encryption keys until the ripe
//! of the pair starts with the configured number of zero bytes and the
//! resulting address string passes validation.

use crate::config::GenerationConfig;
use crate::domain::address::{validate, NetworkAddress};
use crate::domain::derivation::{ripe_from_keys, tag_for};
use crate::error::{AddressError, Result};
use shared_crypto::{KeyPair, PrivateKey};
use shared_types::{AddressRecord, Timestamp};
use tracing::{debug, info, instrument};

/// One of our identities: address plus both key pairs.
#[derive(Debug, Clone)]
pub struct Identity {
    address: NetworkAddress,
    signing: KeyPair,
    encryption: KeyPair,
}

impl Identity {
    /// Decoded address.
    pub fn address(&self) -> &NetworkAddress {
        &self.address
    }

    /// Signing key pair.
    pub fn signing(&self) -> &KeyPair {
        &self.signing
    }

    /// Encryption key pair.
    pub fn encryption(&self) -> &KeyPair {
        &self.encryption
    }

    /// Rebuild from a stored record, checking that the keys match the ripe.
    pub fn from_record(record: &AddressRecord) -> Result<Self> {
        let address = NetworkAddress::parse(&record.address)?;
        let signing = KeyPair::from_private(PrivateKey::from_wif(&record.private_signing_key)?);
        let encryption =
            KeyPair::from_private(PrivateKey::from_wif(&record.private_encryption_key)?);
        if ripe_from_keys(signing.public_key(), encryption.public_key()) != *address.ripe() {
            return Err(AddressError::KeyMismatch(record.address.clone()));
        }
        Ok(Self {
            address,
            signing,
            encryption,
        })
    }

    /// Record to persist, private keys in WIF.
    pub fn to_record(&self, label: impl Into<String>, created: Timestamp) -> AddressRecord {
        AddressRecord {
            id: None,
            label: label.into(),
            address: self.address.encode(),
            version: self.address.version(),
            stream: self.address.stream(),
            ripe: *self.address.ripe(),
            tag: tag_for(&self.address),
            private_signing_key: self.signing.private_key().to_wif(),
            private_encryption_key: self.encryption.private_key().to_wif(),
            created,
        }
    }
}

/// Produces new identities.
#[derive(Debug, Clone, Default)]
pub struct AddressGenerator {
    config: GenerationConfig,
}

impl AddressGenerator {
    /// Create a generator.
    ///
    /// # Errors
    ///
    /// Rejects versions and streams `NetworkAddress::new` would reject.
    pub fn new(config: GenerationConfig) -> Result<Self> {
        NetworkAddress::new(config.version, config.stream, [0u8; 20])?;
        Ok(Self { config })
    }

    /// Generate a fresh identity.
    #[instrument(skip(self), fields(version = self.config.version))]
    pub fn generate(&self) -> Result<Identity> {
        let signing = KeyPair::generate();
        let zeros = self.config.leading_zero_bytes.min(20);
        let mut tries = 0u64;

        loop {
            tries += 1;
            let encryption = KeyPair::generate();
            let ripe = ripe_from_keys(signing.public_key(), encryption.public_key());
            if ripe[..zeros].iter().any(|b| *b != 0) {
                continue;
            }
            let address = NetworkAddress::new(self.config.version, self.config.stream, ripe)?;
            let encoded = address.encode();
            if !validate(&encoded) {
                debug!(tries, "ripe too short for a valid address string, retrying");
                continue;
            }
            info!(address = %encoded, tries, "Generated identity");
            return Ok(Identity {
                address,
                signing,
                encryption,
            });
        }
    }
}
