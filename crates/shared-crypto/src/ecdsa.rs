//! # ECDSA Signatures (secp256k1)
//!
//! Object signatures over SHA-256 digests, DER-encoded on the wire.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Signatures produced here are low-S
//! - High-S signatures from other implementations are normalised before
//!   verification rather than rejected

use crate::keys::{PrivateKey, PublicKey};
use crate::CryptoError;
use k256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};

/// Sign `data` and return the DER-encoded signature.
pub fn sign(private_key: &PrivateKey, data: &[u8]) -> Vec<u8> {
    let signing_key = SigningKey::from(private_key.as_secret());
    let signature: Signature = signing_key.sign(data);
    signature.to_der().as_bytes().to_vec()
}

/// Verify a DER-encoded signature over `data`.
///
/// # Errors
///
/// `CryptoError::SignatureVerificationFailed` if the signature is malformed
/// or does not match.
pub fn verify(public_key: &PublicKey, data: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let verifying_key = VerifyingKey::from(public_key.as_inner());
    let signature =
        Signature::from_der(signature).map_err(|_| CryptoError::SignatureVerificationFailed)?;
    let signature = signature.normalize_s().unwrap_or(signature);

    verifying_key
        .verify(data, &signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;
    use proptest::prelude::*;

    #[test]
    fn test_sign_verify() {
        let pair = KeyPair::generate();
        let message = b"object header and payload";

        let signature = sign(pair.private_key(), message);
        assert!(verify(pair.public_key(), message, &signature).is_ok());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let pair = KeyPair::from_private(PrivateKey::from_bytes(&[0x42; 32]).unwrap());
        assert_eq!(sign(pair.private_key(), b"m"), sign(pair.private_key(), b"m"));
    }

    #[test]
    fn test_wrong_key_fails() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let signature = sign(signer.private_key(), b"payload");
        assert!(matches!(
            verify(other.public_key(), b"payload", &signature),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_garbage_signature_fails() {
        let pair = KeyPair::generate();
        assert!(verify(pair.public_key(), b"payload", &[0x30, 0x02, 0x01]).is_err());
        assert!(verify(pair.public_key(), b"payload", &[]).is_err());
    }

    #[test]
    fn test_high_s_signature_accepted() {
        let pair = KeyPair::generate();
        let data = b"payload";
        let der = sign(pair.private_key(), data);
        let low = Signature::from_der(&der).unwrap();

        // s' = n - s verifies the same message under textbook ECDSA.
        let (r, s) = (low.r(), low.s());
        let high = Signature::from_scalars(r.to_bytes(), (-*s).to_bytes()).unwrap();
        assert!(high.normalize_s().is_some());

        let high_der = high.to_der();
        assert!(verify(pair.public_key(), data, high_der.as_bytes()).is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn proptest_single_bit_flip_fails(
            payload in proptest::collection::vec(any::<u8>(), 1..256),
            bit in any::<usize>(),
        ) {
            let pair = KeyPair::generate();
            let signature = sign(pair.private_key(), &payload);
            prop_assert!(verify(pair.public_key(), &payload, &signature).is_ok());

            let mut altered = payload.clone();
            let bit = bit % (altered.len() * 8);
            altered[bit / 8] ^= 1 << (bit % 8);
            prop_assert!(verify(pair.public_key(), &altered, &signature).is_err());
        }
    }
}
