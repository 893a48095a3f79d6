//! Wire formats of the object types.

pub mod ack;
pub mod encoding;
pub mod envelope;
pub mod getpubkey;
pub mod msg;
pub mod pubkey;

pub use ack::{
    ack_body, frame, is_ack, matches_awaited, unframe, ACK_DATA_LENGTH, NETWORK_HEADER_LENGTH,
    NETWORK_MAGIC,
};
pub use encoding::{MessageEncoding, MessageText};
pub use envelope::{
    attach_nonce, expiration_of, ObjectHeader, ObjectType, RawObject, DEFAULT_STREAM,
    LEGACY_CUTOVER, MAX_OBJECT_VERSION, MAX_TTL, TTL_GRACE,
};
pub use getpubkey::{getpubkey_body, parse_getpubkey, PubkeyIdentifier};
pub use msg::{decrypt_msg, msg_body, ReceivedMsg, UnencryptedMsg};
pub use pubkey::{parse_pubkey, pubkey_body, Pubkey};
