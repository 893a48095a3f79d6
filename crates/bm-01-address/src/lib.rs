//! # Address Codec (bm-01)
//!
//! Bitmessage addresses and everything derived from them.
//!
//! ## Operations
//!
//! | Operation | Result |
//! |-----------|--------|
//! | `validate` | prefix, length and checksum check |
//! | `decode_version_and_stream` | `(version, stream)` |
//! | `extract_ripe_hash` | 20-byte ripe, left-padded |
//! | `encode_address` | `BM-` string |
//! | `encryption_key` / `tag` | v4 pubkey decryption key and lookup tag |
//! | `message_tag` / `message_tags_since` | daily rotating message tags |
//! | `AddressGenerator::generate` | new v4 identity |
//!
//! Every derivation validates its input first and returns
//! [`AddressError`] on malformed addresses.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;

pub use config::GenerationConfig;
pub use domain::*;
pub use error::{AddressError, Result};
