//! # ECIES
//!
//! Hybrid encryption for msg objects and v4 pubkeys.
//!
//! ## Wire Layout
//!
//! ```text
//! IV(16) ‖ curve=0x02CA(2) ‖ xlen(2) ‖ X ‖ ylen(2) ‖ Y ‖ AES-256-CBC ciphertext ‖ MAC(32)
//! ```
//!
//! `(X, Y)` is a fresh ephemeral public key. The shared secret is the x
//! coordinate of `ephemeral · recipient`; `SHA-512(x)` splits into the AES
//! key (first half) and the HMAC-SHA256 key (second half). The MAC covers
//! everything before it and is checked before decryption is attempted.

use crate::hashing::{hmac_sha256, sha512};
use crate::keys::{PrivateKey, PublicKey};
use crate::symmetric::{self, Iv, SymmetricKey, BLOCK_SIZE};
use crate::CryptoError;
use k256::ecdh::diffie_hellman;
use shared_codec::{pad_left, WireReader};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// secp256k1 curve identifier in the ECIES header.
pub const CURVE_SECP256K1: u16 = 0x02CA;

/// HMAC-SHA256 output length.
pub const MAC_LENGTH: usize = 32;

const COORDINATE_LENGTH: usize = 32;

/// Encrypt `plaintext` for the holder of `recipient`'s private key.
pub fn encrypt(recipient: &PublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    encrypt_with(recipient, plaintext, &PrivateKey::generate(), Iv::generate())
}

/// Encrypt with a caller-chosen ephemeral key and IV.
pub fn encrypt_with(
    recipient: &PublicKey,
    plaintext: &[u8],
    ephemeral: &PrivateKey,
    iv: Iv,
) -> Result<Vec<u8>, CryptoError> {
    let (cipher_key, mac_key) = derive_keys(ephemeral, recipient);
    let ciphertext = symmetric::encrypt(&cipher_key, &iv, plaintext);
    let (x, y) = ephemeral.public_key().coordinates();
    seal(&iv, &x, &y, &ciphertext, &mac_key)
}

/// Decrypt an ECIES blob with the recipient's private key.
///
/// # Errors
///
/// - `CryptoError::MalformedCiphertext` for structural problems
/// - `CryptoError::UnsupportedCurve` if the curve id is not secp256k1
/// - `CryptoError::MacMismatch` if the blob was not made for this key
/// - `CryptoError::DecryptionFailed` if padding is invalid after a good MAC
pub fn decrypt(private_key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut reader = WireReader::new(data);
    let iv = Iv::from_bytes(reader.read_array::<BLOCK_SIZE>().map_err(truncated)?);

    let curve = u16::from_be_bytes(reader.read_array::<2>().map_err(truncated)?);
    if curve != CURVE_SECP256K1 {
        return Err(CryptoError::UnsupportedCurve(curve));
    }
    let x = read_coordinate(&mut reader)?;
    let y = read_coordinate(&mut reader)?;

    let header_end = reader.position();
    let rest = reader.rest();
    if rest.len() < BLOCK_SIZE + MAC_LENGTH {
        return Err(CryptoError::MalformedCiphertext(format!(
            "{} bytes after key header, need at least {}",
            rest.len(),
            BLOCK_SIZE + MAC_LENGTH
        )));
    }
    let mac_start = data.len() - MAC_LENGTH;
    let ciphertext = &data[header_end..mac_start];
    let mac = &data[mac_start..];

    let ephemeral = PublicKey::from_coordinates(&x, &y)
        .map_err(|_| CryptoError::MalformedCiphertext("ephemeral key not on curve".into()))?;
    let (cipher_key, mac_key) = derive_keys(private_key, &ephemeral);

    let expected = hmac_sha256(&mac_key[..], &data[..mac_start])?;
    if !bool::from(expected[..].ct_eq(mac)) {
        return Err(CryptoError::MacMismatch);
    }
    symmetric::decrypt(&cipher_key, &iv, ciphertext)
}

fn derive_keys(secret: &PrivateKey, public: &PublicKey) -> (SymmetricKey, Zeroizing<[u8; 32]>) {
    let shared = diffie_hellman(
        secret.as_secret().to_nonzero_scalar(),
        public.as_inner().as_affine(),
    );
    let material = Zeroizing::new(sha512(shared.raw_secret_bytes()));

    let mut cipher_key = [0u8; 32];
    cipher_key.copy_from_slice(&material[..32]);
    let mut mac_key = Zeroizing::new([0u8; 32]);
    mac_key.copy_from_slice(&material[32..]);
    (SymmetricKey::from_bytes(cipher_key), mac_key)
}

fn seal(
    iv: &Iv,
    x: &[u8],
    y: &[u8],
    ciphertext: &[u8],
    mac_key: &[u8; 32],
) -> Result<Vec<u8>, CryptoError> {
    let mut out =
        Vec::with_capacity(BLOCK_SIZE + 6 + x.len() + y.len() + ciphertext.len() + MAC_LENGTH);
    out.extend_from_slice(iv.as_bytes());
    out.extend_from_slice(&CURVE_SECP256K1.to_be_bytes());
    for coordinate in [x, y] {
        let len = u16::try_from(coordinate.len()).map_err(|_| {
            CryptoError::EncryptionFailed("coordinate longer than u16::MAX".into())
        })?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(coordinate);
    }
    out.extend_from_slice(ciphertext);
    let mac = hmac_sha256(mac_key, &out)?;
    out.extend_from_slice(&mac);
    Ok(out)
}

fn read_coordinate(reader: &mut WireReader<'_>) -> Result<[u8; COORDINATE_LENGTH], CryptoError> {
    let len = u16::from_be_bytes(reader.read_array::<2>().map_err(truncated)?) as usize;
    if len > COORDINATE_LENGTH {
        return Err(CryptoError::MalformedCiphertext(format!(
            "coordinate length {} exceeds {}",
            len, COORDINATE_LENGTH
        )));
    }
    let bytes = reader.read_bytes(len).map_err(truncated)?;
    let padded = pad_left(bytes, COORDINATE_LENGTH);
    let mut out = [0u8; COORDINATE_LENGTH];
    out.copy_from_slice(&padded);
    Ok(out)
}

fn truncated(e: shared_codec::CodecError) -> CryptoError {
    CryptoError::MalformedCiphertext(e.to_string())
}
