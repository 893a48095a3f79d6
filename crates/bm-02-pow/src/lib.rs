//! # Proof-of-Work Engine (bm-02)
//!
//! Every object on the network carries an 8-byte nonce proving that the
//! sender spent CPU time proportional to the object's length and lifetime.
//!
//! ## Algorithm
//!
//! ```text
//! initial = SHA-512(object_without_nonce)
//! trial   = BE_u64(SHA-512(SHA-512(nonce_be8 ‖ initial))[..8])
//! accept  ⇔ trial ≤ target(len, ttl, ntpb, extra)
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: target formula, trial values, parallel solver
//! - [`service`]: `PowEngine`, which applies configuration (network
//!   minimum, TTL floor, worker count) to the domain functions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod service;

mod config;
mod error;

pub use config::PowConfig;
pub use domain::{
    check_pow, compute_target, initial_hash, time_to_live, trial_value, PowParameters, PowSolver,
    NONCE_LENGTH,
};
pub use error::{PowError, Result};
pub use service::PowEngine;

/// Network minimum nonce trials per byte.
pub const NETWORK_NONCE_TRIALS_PER_BYTE: u64 = 1000;

/// Network minimum extra bytes.
pub const NETWORK_EXTRA_BYTES: u64 = 1000;

/// Floor for the time-to-live term, in seconds.
pub const MINIMUM_TTL: u64 = 300;
