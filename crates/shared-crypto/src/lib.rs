//! # Shared Crypto - Bitmessage Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256/512, RIPEMD160, HMAC-SHA256 | Checksums, ripe hashes, tags, MACs |
//! | `keys` | secp256k1 scalars/points, WIF | Identity key material |
//! | `symmetric` | AES-256-CBC + PKCS7 | ECIES payload cipher |
//! | `ecies` | ECDH + AES-CBC + HMAC | Msg and v4 pubkey encryption |
//! | `ecdsa` | secp256k1 ECDSA (SHA-256, DER) | Object signatures |
//!
//! ## Security Properties
//!
//! - **ECIES**: MAC verified in constant time before any plaintext is produced
//! - **ECDSA**: RFC 6979 deterministic nonces, high-S signatures normalised on verify
//! - **Keys**: secret scalars zeroized on drop

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod ecies;
pub mod errors;
pub mod hashing;
pub mod keys;
pub mod symmetric;

// Re-exports
pub use ecdsa::{sign, verify};
pub use ecies::{decrypt, encrypt};
pub use errors::CryptoError;
pub use hashing::{
    double_sha256, double_sha512, hash160, hmac_sha256, sha256, sha256_hash160, sha512,
};
pub use keys::{KeyPair, PrivateKey, PublicKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
