//! # Hash Family
//!
//! SHA-512 is the network's primary hash (addresses, tags, proof-of-work);
//! the SHA-256 variants serve legacy-compatible checksums such as WIF.

use crate::CryptoError;
use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute double SHA-256 hash
#[inline]
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD160 over SHA-256
pub fn sha256_hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha256(data)).into()
}

/// Compute SHA-512 hash of data
#[inline]
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let digest = Sha512::digest(data);
    let mut output = [0u8; 64];
    output.copy_from_slice(&digest);
    output
}

/// Compute double SHA-512 hash
#[inline]
pub fn double_sha512(data: &[u8]) -> [u8; 64] {
    sha512(&sha512(data))
}

/// RIPEMD160 over SHA-512, the "ripe hash" of an address.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(sha512(data)).into()
}

/// HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<[u8; 32], CryptoError> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key).map_err(|_| {
        CryptoError::InvalidKeyLength {
            expected: 32,
            actual: key.len(),
        }
    })?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha512_known_answer() {
        assert_eq!(
            hex::encode(&sha512(b"abc")[..32]),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a"
        );
        assert_eq!(
            hex::encode(&double_sha512(b"abc")[..16]),
            "373a9f3a902cf561003b513c94c5164b"
        );
    }

    #[test]
    fn test_hash160_variants() {
        assert_eq!(
            hex::encode(hash160(b"abc")),
            "a1ee188f1a1e322ff95d436c1718d86632d62011"
        );
        assert_eq!(
            hex::encode(sha256_hash160(b"abc")),
            "bb1be98c142444d7a56aa3981c3942a978e4dc33"
        );
    }

    #[test]
    fn test_double_sha256_is_composed() {
        assert_eq!(double_sha256(b"x"), sha256(&sha256(b"x")));
    }

    #[test]
    fn test_hmac_known_answer() {
        let mac = hmac_sha256(b"key", b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            hex::encode(mac),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }
}
