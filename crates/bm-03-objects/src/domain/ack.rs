//! # Acknowledgments
//!
//! An ack is an ordinary msg object whose payload is 32 random bytes. The
//! sender builds it, wraps it in a network message header and embeds the
//! framed bytes in the msg; the recipient strips the header and publishes
//! the object. The sender recognises it by comparing the object
//! byte-for-byte with the acks it is still waiting for.
//!
//! ```text
//! magic(4) ‖ command(12, NUL padded) ‖ length(4) ‖ checksum(4) ‖ object
//! ```

use crate::domain::envelope::{ObjectHeader, ObjectType, RawObject};
use crate::error::{ObjectError, Result};
use shared_crypto::sha512;
use shared_types::Timestamp;

/// Random bytes in an ack payload.
pub const ACK_DATA_LENGTH: usize = 32;

/// Network magic.
pub const NETWORK_MAGIC: u32 = 0xE9BE_B4D9;

/// Size of the network message header.
pub const NETWORK_HEADER_LENGTH: usize = 24;

/// Object version used for acks.
pub const ACK_OBJECT_VERSION: u64 = 1;

const OBJECT_COMMAND: &[u8] = b"object";
const COMMAND_LENGTH: usize = 12;

/// Header and payload of an ack object, without the nonce.
pub fn ack_body(data: &[u8; ACK_DATA_LENGTH], stream: u64, expiration: Timestamp) -> Vec<u8> {
    ObjectHeader::new(ObjectType::Msg, ACK_OBJECT_VERSION, stream, expiration).with_payload(data)
}

/// True when the msg payload has the size of ack data.
pub fn is_ack(raw: &RawObject<'_>) -> bool {
    raw.header.object_type == ObjectType::Msg && raw.payload().len() == ACK_DATA_LENGTH
}

/// Wrap an object in a network `object` message header.
pub fn frame(object: &[u8]) -> Result<Vec<u8>> {
    let length = u32::try_from(object.len())
        .map_err(|_| ObjectError::InvalidNetworkHeader("object too large".into()))?;
    let mut command = [0u8; COMMAND_LENGTH];
    command[..OBJECT_COMMAND.len()].copy_from_slice(OBJECT_COMMAND);

    let mut out = Vec::with_capacity(NETWORK_HEADER_LENGTH + object.len());
    out.extend_from_slice(&NETWORK_MAGIC.to_be_bytes());
    out.extend_from_slice(&command);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(&sha512(object)[..4]);
    out.extend_from_slice(object);
    Ok(out)
}

/// Strip and check the network header.
pub fn unframe(framed: &[u8]) -> Result<&[u8]> {
    if framed.len() < NETWORK_HEADER_LENGTH {
        return Err(ObjectError::InvalidNetworkHeader(format!(
            "{} bytes, need at least {}",
            framed.len(),
            NETWORK_HEADER_LENGTH
        )));
    }
    let (header, object) = framed.split_at(NETWORK_HEADER_LENGTH);
    if header[..4] != NETWORK_MAGIC.to_be_bytes() {
        return Err(ObjectError::InvalidNetworkHeader("bad magic".into()));
    }
    let command = &header[4..16];
    if &command[..OBJECT_COMMAND.len()] != OBJECT_COMMAND
        || command[OBJECT_COMMAND.len()..].iter().any(|b| *b != 0)
    {
        return Err(ObjectError::InvalidNetworkHeader(
            "command is not 'object'".into(),
        ));
    }
    let mut length = [0u8; 4];
    length.copy_from_slice(&header[16..20]);
    if u32::from_be_bytes(length) as usize != object.len() {
        return Err(ObjectError::InvalidNetworkHeader("length mismatch".into()));
    }
    if header[20..24] != sha512(object)[..4] {
        return Err(ObjectError::InvalidNetworkHeader("checksum mismatch".into()));
    }
    Ok(object)
}

/// True when `object` is the ack stored (framed) in `awaited`.
///
/// The nonce is ignored: a relay may have solved it after we sent the ack
/// unsolved.
pub fn matches_awaited(awaited: &[u8], object: &[u8]) -> bool {
    match unframe(awaited) {
        Ok(expected) if expected.len() > 8 && object.len() > 8 => expected[8..] == object[8..],
        _ => false,
    }
}
