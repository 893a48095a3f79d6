//! # Symmetric Encryption
//!
//! AES-256-CBC with PKCS7 padding, the payload cipher inside ECIES.
//! CBC is unauthenticated on its own; callers must check the ECIES MAC
//! before calling [`decrypt`].

use crate::CryptoError;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroize;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block and IV size.
pub const BLOCK_SIZE: usize = 16;

/// Secret key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SymmetricKey([u8; 32]);

impl SymmetricKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// CBC initialisation vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iv([u8; BLOCK_SIZE]);

impl Iv {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Self {
        Self(bytes)
    }

    /// Generate a random IV.
    pub fn generate() -> Self {
        let mut bytes = [0u8; BLOCK_SIZE];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }
}

/// Encrypt plaintext; output length is the next multiple of 16 above
/// `plaintext.len()`.
pub fn encrypt(key: &SymmetricKey, iv: &Iv, plaintext: &[u8]) -> Vec<u8> {
    Aes256CbcEnc::new(key.as_bytes().into(), iv.as_bytes().into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt ciphertext and strip padding.
///
/// # Errors
///
/// Returns `CryptoError::DecryptionFailed` if the length is not a whole
/// number of blocks or the padding is invalid.
pub fn decrypt(key: &SymmetricKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::DecryptionFailed(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        )));
    }
    Aes256CbcDec::new(key.as_bytes().into(), iv.as_bytes().into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed("invalid padding".into()))
}
