//! # Object Codec (bm-03)
//!
//! Builds and parses the four object types that travel the network.
//!
//! ## Object Types
//!
//! | Type | Id | Payload |
//! |------|----|---------|
//! | getpubkey | 0 | ripe (v ≤ 3) or tag (v4) |
//! | pubkey | 1 | keys, difficulty, signature; encrypted to the address from v4 |
//! | msg | 2 | ECIES-encrypted signed plaintext, or 32 ack bytes |
//! | broadcast | 3 | relayed only |
//!
//! ## Acceptance Rules
//!
//! [`ObjectCodec::parse`] rejects objects outside the lifetime window,
//! on another stream, with an unknown version or with insufficient POW.
//! Decryption failures surface as "not for me" errors so callers can try
//! the next identity.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod service;

pub use config::ObjectConfig;
pub use domain::*;
pub use error::{ObjectError, Result};
pub use service::{AckObject, IncomingMsg, ObjectCodec, Recipient, SealedObject};
