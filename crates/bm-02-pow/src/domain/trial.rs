//! Trial values and verification

use crate::domain::target::{compute_target, time_to_live, PowParameters, NONCE_LENGTH};
use crate::error::{PowError, Result};
use shared_crypto::{double_sha512, sha512};
use shared_types::Timestamp;

/// Nonce plus the 8-byte expiration that follows it.
const MIN_OBJECT_LENGTH: usize = NONCE_LENGTH + 8;

/// SHA-512 of the object without its nonce.
pub fn initial_hash(payload: &[u8]) -> [u8; 64] {
    sha512(payload)
}

/// First 8 bytes (BE) of SHA-512(SHA-512(nonce ‖ initial_hash)).
#[inline]
pub fn trial_value(nonce: u64, initial_hash: &[u8; 64]) -> u64 {
    let mut input = [0u8; NONCE_LENGTH + 64];
    input[..NONCE_LENGTH].copy_from_slice(&nonce.to_be_bytes());
    input[NONCE_LENGTH..].copy_from_slice(initial_hash);
    let digest = double_sha512(&input);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Verify the nonce at the front of `object`.
///
/// The expiration time is read from bytes 8..16 of the object.
pub fn check_pow(
    object: &[u8],
    params: PowParameters,
    now: Timestamp,
    minimum_ttl: u64,
) -> Result<bool> {
    if object.len() < MIN_OBJECT_LENGTH {
        return Err(PowError::ObjectTooShort(object.len()));
    }
    let (nonce_bytes, payload) = object.split_at(NONCE_LENGTH);
    let mut nonce = [0u8; NONCE_LENGTH];
    nonce.copy_from_slice(nonce_bytes);
    let mut expiration = [0u8; 8];
    expiration.copy_from_slice(&payload[..8]);

    let ttl = time_to_live(u64::from_be_bytes(expiration), now, minimum_ttl);
    let target = compute_target(object.len(), ttl, params)?;
    Ok(trial_value(u64::from_be_bytes(nonce), &initial_hash(payload)) <= target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trial_value_matches_definition() {
        let hash = initial_hash(b"payload");
        let mut input = 7u64.to_be_bytes().to_vec();
        input.extend_from_slice(&hash);
        let digest = double_sha512(&input);
        let expected = u64::from_be_bytes(digest[..8].try_into().unwrap());
        assert_eq!(trial_value(7, &hash), expected);
    }

    #[test]
    fn test_short_object_rejected() {
        assert_eq!(
            check_pow(&[0u8; 15], PowParameters::new(1000, 1000), 0, 300),
            Err(PowError::ObjectTooShort(15))
        );
    }

    #[test]
    fn test_check_pow_agrees_with_trial_value() {
        let mut object = vec![0u8; 16];
        object[8..].copy_from_slice(&1_000u64.to_be_bytes());
        let target = compute_target(16, 300, PowParameters::new(1, 0)).unwrap();
        let value = trial_value(0, &initial_hash(&object[8..]));
        assert_eq!(
            check_pow(&object, PowParameters::new(1, 0), 1_000, 300).unwrap(),
            value <= target
        );
    }
}
