//! # Shared Codec - Wire Primitives
//!
//! Foundation for every structure that crosses the wire.
//!
//! ## Components
//!
//! | Module | Encoding | Use Case |
//! |--------|----------|----------|
//! | `varint` | Variable-length integer | Versions, streams, lengths |
//! | `int` | Fixed-width big-endian | Nonces, times, object types |
//! | `base58` | Bitcoin alphabet | Address strings, WIF keys |
//! | `bytes` | Padding / slicing | Ripe hash restoration |
//! | `reader` | Sequential cursor | Object decoding |
//!
//! All multi-byte integers on this network are big-endian.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod base58;
pub mod bytes;
pub mod errors;
pub mod int;
pub mod reader;
pub mod varint;

// Re-exports
pub use base58::{decode_base58, encode_base58};
pub use bytes::{concat, copy_range, pad_left, strip_leading_zeros};
pub use errors::CodecError;
pub use int::{decode_u16, decode_u32, decode_u64, encode_u16, encode_u32, encode_u64};
pub use reader::WireReader;
pub use varint::{decode_varint, encode_varint, try_encode_varint, varint_len};
