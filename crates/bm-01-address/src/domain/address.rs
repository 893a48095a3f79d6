//! # Address Codec
//!
//! ```text
//! BM- ‖ base58( varint(version) ‖ varint(stream) ‖ ripe_stripped ‖ checksum4 )
//! ```
//!
//! `checksum4` is the first four bytes of SHA-512(SHA-512(data)). Version 4
//! strips every leading zero byte of the ripe; earlier versions strip at
//! most two. Decoding pads the ripe back to 20 bytes.

use crate::error::{AddressError, Result};
use shared_codec::{decode_base58, encode_base58, encode_varint, strip_leading_zeros, WireReader};
use shared_crypto::double_sha512;
use shared_types::Ripe;
use std::fmt;
use std::str::FromStr;

/// Human-readable prefix.
pub const ADDRESS_PREFIX: &str = "BM-";

/// Shortest valid address string.
pub const MIN_ADDRESS_LENGTH: usize = 35;

/// Longest valid address string.
pub const MAX_ADDRESS_LENGTH: usize = 38;

/// Highest address version understood.
pub const MAX_ADDRESS_VERSION: u64 = 4;

const CHECKSUM_LENGTH: usize = 4;
const RIPE_LENGTH: usize = 20;
const LEGACY_MAX_STRIP: usize = 2;
const LEGACY_MIN_RIPE: usize = RIPE_LENGTH - LEGACY_MAX_STRIP;
const V4_MIN_RIPE: usize = 4;

/// Decoded address: version, stream and 20-byte ripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkAddress {
    version: u64,
    stream: u64,
    ripe: Ripe,
}

impl NetworkAddress {
    /// Build from parts.
    ///
    /// # Errors
    ///
    /// `UnsupportedVersion` outside 1..=4, `InvalidStream` for stream 0.
    pub fn new(version: u64, stream: u64, ripe: Ripe) -> Result<Self> {
        if version == 0 || version > MAX_ADDRESS_VERSION {
            return Err(AddressError::UnsupportedVersion(version));
        }
        if stream == 0 {
            return Err(AddressError::InvalidStream(stream));
        }
        Ok(Self {
            version,
            stream,
            ripe,
        })
    }

    /// Parse and fully validate an address string.
    pub fn parse(address: &str) -> Result<Self> {
        let len = address.chars().count();
        if !(MIN_ADDRESS_LENGTH..=MAX_ADDRESS_LENGTH).contains(&len) {
            return Err(AddressError::InvalidLength(len));
        }
        let encoded = address
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or(AddressError::MissingPrefix)?;

        let raw = decode_base58(encoded)?;
        if raw.len() <= CHECKSUM_LENGTH {
            return Err(AddressError::ChecksumMismatch);
        }
        let (data, checksum) = raw.split_at(raw.len() - CHECKSUM_LENGTH);
        if double_sha512(data)[..CHECKSUM_LENGTH] != *checksum {
            return Err(AddressError::ChecksumMismatch);
        }

        let mut reader = WireReader::new(data);
        let version = reader.read_varint()?;
        let stream = reader.read_varint()?;
        let embedded = reader.read_rest();

        let ripe_ok = match version {
            1..=3 => (LEGACY_MIN_RIPE..=RIPE_LENGTH).contains(&embedded.len()),
            4 => {
                (V4_MIN_RIPE..=RIPE_LENGTH).contains(&embedded.len())
                    && embedded.first() != Some(&0)
            }
            other => return Err(AddressError::UnsupportedVersion(other)),
        };
        if !ripe_ok {
            return Err(AddressError::InvalidRipe {
                version,
                length: embedded.len(),
            });
        }

        let mut ripe = [0u8; RIPE_LENGTH];
        ripe[RIPE_LENGTH - embedded.len()..].copy_from_slice(embedded);
        Self::new(version, stream, ripe)
    }

    /// Address version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stream number.
    pub fn stream(&self) -> u64 {
        self.stream
    }

    /// Full 20-byte ripe.
    pub fn ripe(&self) -> &Ripe {
        &self.ripe
    }

    /// `varint(version) ‖ varint(stream) ‖ ripe20`, the input of every
    /// address-derived hash.
    pub fn hash_input(&self) -> Vec<u8> {
        let mut data = encode_varint(self.version);
        data.extend_from_slice(&encode_varint(self.stream));
        data.extend_from_slice(&self.ripe);
        data
    }

    /// `BM-` string form.
    pub fn encode(&self) -> String {
        let max_strip = if self.version >= 4 {
            RIPE_LENGTH
        } else {
            LEGACY_MAX_STRIP
        };
        let mut data = encode_varint(self.version);
        data.extend_from_slice(&encode_varint(self.stream));
        data.extend_from_slice(strip_leading_zeros(&self.ripe, max_strip));
        let checksum = double_sha512(&data);
        data.extend_from_slice(&checksum[..CHECKSUM_LENGTH]);
        format!("{}{}", ADDRESS_PREFIX, encode_base58(&data))
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for NetworkAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// True when `address` has the right prefix, length and checksum.
pub fn validate(address: &str) -> bool {
    NetworkAddress::parse(address).is_ok()
}

/// Decode version and stream.
pub fn decode_version_and_stream(address: &str) -> Result<(u64, u64)> {
    let decoded = NetworkAddress::parse(address)?;
    Ok((decoded.version, decoded.stream))
}

/// Decode the 20-byte ripe (left-padded).
pub fn extract_ripe_hash(address: &str) -> Result<Ripe> {
    NetworkAddress::parse(address).map(|a| a.ripe)
}

/// Encode parts as a `BM-` string.
pub fn encode_address(version: u64, stream: u64, ripe: &Ripe) -> Result<String> {
    NetworkAddress::new(version, stream, *ripe).map(|a| a.encode())
}
