//! Target computation
//!
//! ```text
//! target = 2^64 / (ntpb * (L + extra + ((L + extra) * ttl) / 2^16))
//! ```
//!
//! `L` is the full object length including the 8-byte nonce. Computed in
//! U256 so no intermediate product can overflow; the result saturates at
//! `u64::MAX`.

use crate::error::{PowError, Result};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::Timestamp;

/// Length of the nonce prefix.
pub const NONCE_LENGTH: usize = 8;

/// Difficulty parameters an identity advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PowParameters {
    /// Nonce trials per byte.
    pub nonce_trials_per_byte: u64,
    /// Extra bytes added to the length.
    pub extra_bytes: u64,
}

impl PowParameters {
    /// Build from raw values.
    pub fn new(nonce_trials_per_byte: u64, extra_bytes: u64) -> Self {
        Self {
            nonce_trials_per_byte,
            extra_bytes,
        }
    }

    /// Raise each value to at least `minimum`.
    pub fn at_least(self, minimum: PowParameters) -> Self {
        Self {
            nonce_trials_per_byte: self.nonce_trials_per_byte.max(minimum.nonce_trials_per_byte),
            extra_bytes: self.extra_bytes.max(minimum.extra_bytes),
        }
    }
}

/// Effective time-to-live: `max(expiration - now, minimum_ttl)`.
pub fn time_to_live(expiration: Timestamp, now: Timestamp, minimum_ttl: u64) -> u64 {
    expiration.saturating_sub(now).max(minimum_ttl)
}

/// Target for an object of `object_length` bytes (nonce included).
///
/// # Errors
///
/// `PowError::InvalidParameters` when the divisor is zero.
pub fn compute_target(object_length: usize, ttl: u64, params: PowParameters) -> Result<u64> {
    let length = U256::from(object_length as u64) + U256::from(params.extra_bytes);
    let divisor = U256::from(params.nonce_trials_per_byte)
        * (length + (length * U256::from(ttl)) / U256::from(1u64 << 16));
    if divisor.is_zero() {
        return Err(PowError::InvalidParameters(format!(
            "zero divisor for length {} with {:?}",
            object_length, params
        )));
    }
    let target = (U256::one() << 64) / divisor;
    Ok(if target > U256::from(u64::MAX) {
        u64::MAX
    } else {
        target.low_u64()
    })
}
