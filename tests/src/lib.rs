//! # Bitmessage Core Test Suite
//!
//! ```text
//! tests/
//! ├── src/harness.rs       # Simulated relay network and nodes
//! ├── src/integration/     # Cross-crate flows driven through the queue
//! └── benches/             # POW, ECIES and address benchmarks
//! ```
//!
//! ```bash
//! cargo test -p bm-tests
//! cargo bench -p bm-tests
//! ```

pub mod harness;
pub mod integration;
