//! Pure proof-of-work logic.

pub mod solver;
pub mod target;
pub mod trial;

pub use solver::PowSolver;
pub use target::{compute_target, time_to_live, PowParameters, NONCE_LENGTH};
pub use trial::{check_pow, initial_hash, trial_value};
