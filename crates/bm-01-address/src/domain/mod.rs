//! Pure address logic: codec, derivations, generation.

pub mod address;
pub mod derivation;
pub mod generation;

pub use address::{
    decode_version_and_stream, encode_address, extract_ripe_hash, validate, NetworkAddress,
    ADDRESS_PREFIX, MAX_ADDRESS_LENGTH, MIN_ADDRESS_LENGTH,
};
pub use derivation::{
    day_start, encryption_key, encryption_key_for, message_tag, message_tag_for,
    message_tags_since, ripe_from_keys, tag, tag_for, SECONDS_PER_DAY,
};
pub use generation::{AddressGenerator, Identity};
