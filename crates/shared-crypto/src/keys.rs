//! # secp256k1 Keys
//!
//! Private keys are scalars; public keys are uncompressed points carried on
//! the wire as 64 raw bytes (x ‖ y). Some contexts (ripe hashing, SEC1
//! parsing) need the 65-byte form with the leading `0x04` tag.
//!
//! Scalars produced by signed big-integer serialisers sometimes carry an
//! extra leading zero byte (two's-complement sign guard) or lose leading
//! zeros. Both are normalised to exactly 32 bytes before use.

use crate::hashing::double_sha256;
use crate::CryptoError;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use shared_codec::{decode_base58, encode_base58};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Raw private scalar length.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Untagged public key length (x ‖ y).
pub const PUBLIC_KEY_LENGTH: usize = 64;

/// Tagged public key length (0x04 ‖ x ‖ y).
pub const TAGGED_PUBLIC_KEY_LENGTH: usize = 65;

const UNCOMPRESSED_TAG: u8 = 0x04;
const WIF_MARKER: u8 = 0x80;
const WIF_CHECKSUM_LENGTH: usize = 4;

/// secp256k1 private key.
#[derive(Clone)]
pub struct PrivateKey(SecretKey);

impl PrivateKey {
    /// Generate a random key.
    pub fn generate() -> Self {
        Self(SecretKey::random(&mut rand::thread_rng()))
    }

    /// Build from a big-endian scalar encoding.
    ///
    /// Accepts 1..=32 bytes (left-padded) or 33 bytes with a leading zero
    /// sign byte (stripped).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let scalar = normalise_scalar(bytes)?;
        SecretKey::from_bytes((&*scalar).into())
            .map(Self)
            .map_err(|_| CryptoError::InvalidPrivateKey)
    }

    /// Big-endian 32-byte scalar.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.0.to_bytes().into()
    }

    /// Derive the public point.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.public_key())
    }

    /// Wallet-Import-Format encoding.
    pub fn to_wif(&self) -> String {
        let mut data = Zeroizing::new(Vec::with_capacity(1 + PRIVATE_KEY_LENGTH + WIF_CHECKSUM_LENGTH));
        data.push(WIF_MARKER);
        data.extend_from_slice(&self.to_bytes());
        let checksum = double_sha256(&data);
        data.extend_from_slice(&checksum[..WIF_CHECKSUM_LENGTH]);
        encode_base58(&data)
    }

    /// Decode a Wallet-Import-Format string.
    ///
    /// # Errors
    ///
    /// `CryptoError::InvalidWif` if the marker byte or checksum is wrong.
    pub fn from_wif(wif: &str) -> Result<Self, CryptoError> {
        let decoded = Zeroizing::new(decode_base58(wif)?);
        let expected = 1 + PRIVATE_KEY_LENGTH + WIF_CHECKSUM_LENGTH;
        if decoded.len() != expected {
            return Err(CryptoError::InvalidWif(format!(
                "expected {} bytes, got {}",
                expected,
                decoded.len()
            )));
        }

        let (body, checksum) = decoded.split_at(decoded.len() - WIF_CHECKSUM_LENGTH);
        let computed = double_sha256(body);
        if !bool::from(computed[..WIF_CHECKSUM_LENGTH].ct_eq(checksum)) {
            return Err(CryptoError::InvalidWif("checksum mismatch".into()));
        }
        if body[0] != WIF_MARKER {
            return Err(CryptoError::InvalidWif(format!(
                "marker byte {:#04x}",
                body[0]
            )));
        }
        Self::from_bytes(&body[1..])
    }

    pub(crate) fn as_secret(&self) -> &SecretKey {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.to_bytes()[..].ct_eq(&other.to_bytes()[..]))
    }
}

impl Eq for PrivateKey {}

fn normalise_scalar(bytes: &[u8]) -> Result<Zeroizing<[u8; PRIVATE_KEY_LENGTH]>, CryptoError> {
    let trimmed = match bytes {
        [0, rest @ ..] if bytes.len() == PRIVATE_KEY_LENGTH + 1 => rest,
        _ => bytes,
    };
    if trimmed.is_empty() || trimmed.len() > PRIVATE_KEY_LENGTH {
        return Err(CryptoError::InvalidKeyLength {
            expected: PRIVATE_KEY_LENGTH,
            actual: bytes.len(),
        });
    }
    let mut scalar = Zeroizing::new([0u8; PRIVATE_KEY_LENGTH]);
    scalar[PRIVATE_KEY_LENGTH - trimmed.len()..].copy_from_slice(trimmed);
    Ok(scalar)
}

/// Uncompressed secp256k1 public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(k256::PublicKey);

impl PublicKey {
    /// Parse 64 untagged bytes or 65 bytes tagged with `0x04`.
    ///
    /// # Errors
    ///
    /// - `CryptoError::InvalidKeyLength` for any other length
    /// - `CryptoError::InvalidPublicKey` if the point is not on the curve
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut tagged = [0u8; TAGGED_PUBLIC_KEY_LENGTH];
        match bytes.len() {
            PUBLIC_KEY_LENGTH => {
                tagged[0] = UNCOMPRESSED_TAG;
                tagged[1..].copy_from_slice(bytes);
            }
            TAGGED_PUBLIC_KEY_LENGTH if bytes[0] == UNCOMPRESSED_TAG => {
                tagged.copy_from_slice(bytes);
            }
            TAGGED_PUBLIC_KEY_LENGTH => return Err(CryptoError::InvalidPublicKey),
            other => {
                return Err(CryptoError::InvalidKeyLength {
                    expected: PUBLIC_KEY_LENGTH,
                    actual: other,
                })
            }
        }
        k256::PublicKey::from_sec1_bytes(&tagged)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Build from separate affine coordinates.
    pub fn from_coordinates(x: &[u8; 32], y: &[u8; 32]) -> Result<Self, CryptoError> {
        let mut raw = [0u8; PUBLIC_KEY_LENGTH];
        raw[..32].copy_from_slice(x);
        raw[32..].copy_from_slice(y);
        Self::from_bytes(&raw)
    }

    /// 64-byte wire form without the tag.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let tagged = self.to_tagged_bytes();
        let mut out = [0u8; PUBLIC_KEY_LENGTH];
        out.copy_from_slice(&tagged[1..]);
        out
    }

    /// 65-byte SEC1 uncompressed form.
    pub fn to_tagged_bytes(&self) -> [u8; TAGGED_PUBLIC_KEY_LENGTH] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; TAGGED_PUBLIC_KEY_LENGTH];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Affine (x, y) coordinates, each 32 bytes.
    pub fn coordinates(&self) -> ([u8; 32], [u8; 32]) {
        let raw = self.to_bytes();
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&raw[..32]);
        y.copy_from_slice(&raw[32..]);
        (x, y)
    }

    pub(crate) fn as_inner(&self) -> &k256::PublicKey {
        &self.0
    }
}

/// A private key together with its public point.
#[derive(Clone, Debug)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a random key pair.
    pub fn generate() -> Self {
        Self::from_private(PrivateKey::generate())
    }

    /// Derive the public half from a private key.
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Private half.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    /// Public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_derivation_is_deterministic() {
        let private = PrivateKey::from_bytes(&[0x11; 32]).unwrap();
        let again = PrivateKey::from_bytes(&[0x11; 32]).unwrap();
        assert_eq!(private.public_key(), again.public_key());
    }

    #[test]
    fn test_sign_guard_byte_is_stripped() {
        let mut guarded = vec![0u8];
        guarded.extend_from_slice(&[0xf0; 32]);
        let a = PrivateKey::from_bytes(&guarded).unwrap();
        let b = PrivateKey::from_bytes(&[0xf0; 32]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_scalar_is_left_padded() {
        let short = PrivateKey::from_bytes(&[0x01; 31]).unwrap();
        let mut padded = [0u8; 32];
        padded[1..].copy_from_slice(&[0x01; 31]);
        assert_eq!(short.to_bytes(), padded);
    }

    #[test]
    fn test_zero_scalar_rejected() {
        assert!(matches!(
            PrivateKey::from_bytes(&[0u8; 32]),
            Err(CryptoError::InvalidPrivateKey)
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&[1u8; 34]),
            Err(CryptoError::InvalidKeyLength { .. })
        ));
    }

    #[test]
    fn test_public_key_tag_handling() {
        let public = KeyPair::generate().public_key().to_owned();
        let tagged = public.to_tagged_bytes();
        assert_eq!(tagged[0], 0x04);
        assert_eq!(&tagged[1..], &public.to_bytes()[..]);
        assert_eq!(PublicKey::from_bytes(&tagged).unwrap(), public);
        assert_eq!(PublicKey::from_bytes(&public.to_bytes()).unwrap(), public);

        let mut wrong_tag = tagged;
        wrong_tag[0] = 0x02;
        assert!(PublicKey::from_bytes(&wrong_tag).is_err());
    }

    #[test]
    fn test_point_off_curve_rejected() {
        assert!(matches!(
            PublicKey::from_bytes(&[0x01; 64]),
            Err(CryptoError::InvalidPublicKey)
        ));
    }

    #[test]
    fn test_wif_known_answer() {
        let private = PrivateKey::from_bytes(&[0x01; 32]).unwrap();
        let wif = private.to_wif();
        assert_eq!(wif, "5HpjE2Hs7vjU4SN3YyPQCdhzCu92WoEeuE6PWNuiPyTu3ESGnzn");
        assert_eq!(PrivateKey::from_wif(&wif).unwrap(), private);
    }

    #[test]
    fn test_wif_checksum_failure() {
        let wif = PrivateKey::generate().to_wif();
        let mut chars: Vec<char> = wif.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'a' { 'b' } else { 'a' };
        let tampered: String = chars.into_iter().collect();
        assert!(PrivateKey::from_wif(&tampered).is_err());
    }

    #[test]
    fn test_wif_marker_failure() {
        let mut data = vec![0x81];
        data.extend_from_slice(&[0x01; 32]);
        let checksum = double_sha256(&data);
        data.extend_from_slice(&checksum[..4]);
        let wif = encode_base58(&data);
        assert!(matches!(
            PrivateKey::from_wif(&wif),
            Err(CryptoError::InvalidWif(_))
        ));
    }
}
