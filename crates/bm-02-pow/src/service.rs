//! Proof-of-work service
//!
//! Wraps the domain functions with configuration: the network minimum
//! difficulty, the TTL floor and the worker count.

use crate::config::PowConfig;
use crate::domain::{
    check_pow, compute_target, initial_hash, time_to_live, PowParameters, PowSolver, NONCE_LENGTH,
};
use crate::error::Result;
use shared_types::Timestamp;
use tracing::{debug, instrument};

/// Configured solver and verifier.
#[derive(Debug, Clone)]
pub struct PowEngine {
    config: PowConfig,
    solver: PowSolver,
}

impl PowEngine {
    /// Create from configuration.
    pub fn new(config: PowConfig) -> Self {
        let solver = PowSolver::new(config.worker_threads());
        let solver = match config.max_nonce {
            Some(limit) => solver.with_limit(limit),
            None => solver,
        };
        Self { config, solver }
    }

    /// Active configuration.
    pub fn config(&self) -> &PowConfig {
        &self.config
    }

    /// True when POW is done locally rather than by the relay.
    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Network minimum difficulty.
    pub fn network_minimum(&self) -> PowParameters {
        self.config.network_minimum()
    }

    /// Difficulty to use for a recipient advertising `requested`.
    ///
    /// Values below the network minimum are raised to it; `None` means the
    /// recipient advertises nothing (v2 pubkeys) and the minimum applies.
    pub fn effective_parameters(&self, requested: Option<PowParameters>) -> PowParameters {
        let minimum = self.network_minimum();
        requested.map_or(minimum, |p| p.at_least(minimum))
    }

    /// Target for a payload (nonce excluded) expiring at `expiration`.
    pub fn target_for(
        &self,
        payload_length: usize,
        expiration: Timestamp,
        params: PowParameters,
        now: Timestamp,
    ) -> Result<u64> {
        let ttl = time_to_live(expiration, now, self.config.minimum_ttl);
        compute_target(payload_length + NONCE_LENGTH, ttl, params)
    }

    /// Find a nonce for `payload` (the object without its nonce).
    #[instrument(skip(self, payload), fields(len = payload.len()))]
    pub fn solve(
        &self,
        payload: &[u8],
        expiration: Timestamp,
        params: PowParameters,
        now: Timestamp,
    ) -> Result<u64> {
        let target = self.target_for(payload.len(), expiration, params, now)?;
        debug!(target, ?params, "Starting POW");
        self.solver.solve(&initial_hash(payload), target)
    }

    /// Solve and return `nonce ‖ payload`.
    pub fn seal(
        &self,
        payload: &[u8],
        expiration: Timestamp,
        params: PowParameters,
        now: Timestamp,
    ) -> Result<Vec<u8>> {
        let nonce = self.solve(payload, expiration, params, now)?;
        let mut object = Vec::with_capacity(NONCE_LENGTH + payload.len());
        object.extend_from_slice(&nonce.to_be_bytes());
        object.extend_from_slice(payload);
        Ok(object)
    }

    /// Verify the nonce of a complete object.
    pub fn verify(&self, object: &[u8], params: PowParameters, now: Timestamp) -> Result<bool> {
        check_pow(object, params, now, self.config.minimum_ttl)
    }
}

impl Default for PowEngine {
    fn default() -> Self {
        Self::new(PowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NOW: Timestamp = 1_700_000_000;

    fn easy_engine() -> PowEngine {
        PowEngine::new(PowConfig {
            nonce_trials_per_byte: 2,
            extra_bytes: 10,
            threads: 2,
            ..PowConfig::default()
        })
    }

    fn payload(expiration: Timestamp, body: &[u8]) -> Vec<u8> {
        let mut p = expiration.to_be_bytes().to_vec();
        p.extend_from_slice(&[0, 0, 0, 2, 1, 1]);
        p.extend_from_slice(body);
        p
    }

    #[test]
    fn test_seal_then_verify() {
        let engine = easy_engine();
        let params = engine.network_minimum();
        let expiration = NOW + 3_600;
        let object = engine
            .seal(&payload(expiration, b"hello"), expiration, params, NOW)
            .unwrap();
        assert!(engine.verify(&object, params, NOW).unwrap());
    }

    #[test]
    fn test_tampered_object_fails() {
        let engine = PowEngine::new(PowConfig {
            nonce_trials_per_byte: 512,
            extra_bytes: 100,
            threads: 2,
            ..PowConfig::default()
        });
        let params = engine.network_minimum();
        let expiration = NOW + 3_600;
        let mut object = engine
            .seal(&payload(expiration, b"message body"), expiration, params, NOW)
            .unwrap();
        let last = object.len() - 1;
        object[last] ^= 0xFF;
        // Target is about 2^64 / 72000; a changed body passes with negligible odds.
        assert!(!engine.verify(&object, params, NOW).unwrap());
    }

    #[test]
    fn test_effective_parameters() {
        let engine = PowEngine::default();
        assert_eq!(
            engine.effective_parameters(None),
            PowParameters::new(1000, 1000)
        );
        assert_eq!(
            engine.effective_parameters(Some(PowParameters::new(5000, 10))),
            PowParameters::new(5000, 1000)
        );
    }

    #[test]
    fn test_nonce_limit_exhausts_hard_search() {
        let engine = PowEngine::new(PowConfig {
            threads: 2,
            max_nonce: Some(200),
            ..PowConfig::default()
        });
        let expiration = NOW + 3_600;
        let hard = PowParameters::new(u64::MAX, 1000);
        assert_eq!(
            engine.solve(&payload(expiration, b"never"), expiration, hard, NOW),
            Err(crate::PowError::Exhausted)
        );
    }

    #[test]
    fn test_expired_object_uses_ttl_floor() {
        let engine = easy_engine();
        let params = engine.network_minimum();
        let past = engine.target_for(100, NOW - 10, params, NOW).unwrap();
        let floor = engine.target_for(100, NOW + 300, params, NOW).unwrap();
        assert_eq!(past, floor);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn proptest_acceptance_monotonic_in_difficulty(
            body in proptest::collection::vec(any::<u8>(), 0..64),
            ttl in 300u64..100_000,
            ntpb in 2u64..8,
        ) {
            let engine = easy_engine();
            let expiration = NOW + ttl;
            let hard = PowParameters::new(ntpb, 10);
            let object = engine.seal(&payload(expiration, &body), expiration, hard, NOW).unwrap();

            prop_assert!(engine.verify(&object, hard, NOW).unwrap());
            // Lower difficulty means a higher target, so the same nonce still passes.
            for easier in 1..ntpb {
                prop_assert!(engine.verify(&object, PowParameters::new(easier, 10), NOW).unwrap());
            }
        }
    }
}
