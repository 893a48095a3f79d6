//! # Persisted Entities
//!
//! The records the store holds, grouped by lifecycle:
//!
//! - **Identity**: `AddressRecord` (own identities), `PubkeyRecord` (own and remote keys)
//! - **Content**: `MessageRecord`, `PayloadRecord` (wire-ready objects)
//! - **Scheduling**: `QueueRecord`
//! - **Transport**: `ServerRecord`
//!
//! Every record carries an `Option<RecordId>` that is `None` until the store
//! assigns an id on `add`.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

/// Store-assigned identifier.
pub type RecordId = u64;

/// Unix time in seconds.
pub type Timestamp = u64;

/// A 20-byte ripe hash.
pub type Ripe = [u8; 20];

/// A 32-byte address tag.
pub type Tag = [u8; 32];

/// An untagged 64-byte public key.
pub type RawPublicKey = [u8; 64];

// =============================================================================
// ENUMS
// =============================================================================

/// Behaviour bitfield advertised in pubkeys and msgs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BehaviourBitfield(pub u32);

impl BehaviourBitfield {
    /// The identity sends acknowledgments for received messages.
    pub const SENDS_ACKS: u32 = 1;
    /// Senders must include the destination ripe.
    pub const INCLUDE_DESTINATION: u32 = 2;

    /// Bitfield used for freshly generated identities.
    pub fn standard() -> Self {
        Self(Self::SENDS_ACKS)
    }

    /// True when the owner acknowledges messages.
    pub fn sends_acks(self) -> bool {
        self.0 & Self::SENDS_ACKS != 0
    }

    /// True when senders must include the destination.
    pub fn includes_destination(self) -> bool {
        self.0 & Self::INCLUDE_DESTINATION != 0
    }

    /// Wire form (4 bytes big-endian).
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

/// What a persisted payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayloadKind {
    /// Encrypted msg object.
    Msg,
    /// Pubkey object.
    Pubkey,
    /// Getpubkey request object.
    GetPubkey,
    /// Acknowledgment (network-framed msg object with 32 random bytes).
    Ack,
}

/// Delivery status surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    /// Accepted for sending, nothing done yet.
    Queued,
    /// Waiting for the recipient's pubkey.
    RequestingPubkey,
    /// Signing, encrypting and doing proof of work.
    ProcessingOutgoing,
    /// Handing the object to a relay.
    Disseminating,
    /// Disseminated; the recipient is expected to acknowledge.
    AwaitingAck,
    /// Disseminated; no acknowledgment expected.
    Sent,
    /// The recipient's acknowledgment arrived.
    Acknowledged,
    /// Gave up.
    Failed,
    /// Incoming message.
    Received,
}

impl MessageStatus {
    /// Human-readable status line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::RequestingPubkey => "Requesting the recipient's public key",
            Self::ProcessingOutgoing => "Encrypting message and doing proof of work",
            Self::Disseminating => "Sending message",
            Self::AwaitingAck => "Message sent, waiting for acknowledgment",
            Self::Sent => "Message sent",
            Self::Acknowledged => "Acknowledgment received",
            Self::Failed => "Sending failed",
            Self::Received => "Received",
        }
    }

    /// No further transitions happen from this status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Sent | Self::Acknowledged | Self::Failed | Self::Received
        )
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of work a queue record stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Resolve the recipient's pubkey for a message.
    SendMessage,
    /// Build, sign, encrypt and POW a message.
    ProcessOutgoingMessage,
    /// Hand a finished msg payload to a relay.
    DisseminateMessage,
    /// Publish one of our own pubkeys.
    DisseminatePubkey,
    /// Publish an acknowledgment for a message we received.
    DisseminateAck,
    /// Fetch new objects from relays and process them.
    CheckForMessages,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Type tag for a reference held by a queue record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    /// `AddressRecord`
    Address,
    /// `PubkeyRecord`
    Pubkey,
    /// `MessageRecord`
    Message,
    /// `PayloadRecord`
    Payload,
    /// `QueueRecord`
    Queue,
    /// `ServerRecord`
    Server,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Typed pointer to another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Which table the id belongs to.
    pub kind: RecordKind,
    /// Row id.
    pub id: RecordId,
}

impl ObjectRef {
    /// Reference to a message.
    pub fn message(id: RecordId) -> Self {
        Self { kind: RecordKind::Message, id }
    }

    /// Reference to a payload.
    pub fn payload(id: RecordId) -> Self {
        Self { kind: RecordKind::Payload, id }
    }

    /// Reference to a pubkey.
    pub fn pubkey(id: RecordId) -> Self {
        Self { kind: RecordKind::Pubkey, id }
    }

    /// Reference to an address.
    pub fn address(id: RecordId) -> Self {
        Self { kind: RecordKind::Address, id }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// One of our own identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Store id.
    pub id: Option<RecordId>,
    /// User label.
    pub label: String,
    /// `BM-` string form.
    pub address: String,
    /// Address version.
    pub version: u64,
    /// Stream number.
    pub stream: u64,
    /// Ripe hash of the key pair.
    pub ripe: Ripe,
    /// Tag derived from the address (v4 lookups).
    pub tag: Tag,
    /// WIF-encoded private signing key.
    pub private_signing_key: String,
    /// WIF-encoded private encryption key.
    pub private_encryption_key: String,
    /// Creation time.
    pub created: Timestamp,
}

/// A pubkey, ours or a correspondent's.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubkeyRecord {
    /// Store id.
    pub id: Option<RecordId>,
    /// True for keys of our own identities.
    pub belongs_to_me: bool,
    /// Ripe hash of the key pair.
    pub ripe: Ripe,
    /// Address tag (v4 lookups).
    pub tag: Tag,
    /// Address version.
    pub address_version: u64,
    /// Stream number.
    pub stream: u64,
    /// Advertised behaviour.
    pub behaviour: BehaviourBitfield,
    /// Public signing key.
    #[serde_as(as = "Bytes")]
    pub signing_key: RawPublicKey,
    /// Public encryption key.
    #[serde_as(as = "Bytes")]
    pub encryption_key: RawPublicKey,
    /// Required POW nonce trials per byte.
    pub nonce_trials_per_byte: u64,
    /// Required POW extra bytes.
    pub extra_bytes: u64,
    /// Nonce of the pubkey object this record came from.
    pub pow_nonce: u64,
    /// Expiration of the pubkey object this record came from.
    pub expiration: Timestamp,
    /// Signature (empty for version ≤ 2).
    pub signature: Vec<u8>,
}

impl PubkeyRecord {
    /// Length of the stored signature.
    pub fn signature_length(&self) -> usize {
        self.signature.len()
    }
}

/// A sent or received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Store id.
    pub id: Option<RecordId>,
    /// True for messages we sent.
    pub belongs_to_me: bool,
    /// Read by the user.
    pub read: bool,
    /// Delivery status.
    pub status: MessageStatus,
    /// Recipient address.
    pub to_address: String,
    /// Sender address.
    pub from_address: String,
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
    /// Creation or receipt time.
    pub created: Timestamp,
    /// Ack payload we wait for (outgoing) or must disseminate (incoming).
    pub ack_payload_id: Option<RecordId>,
    /// Encrypted msg payload.
    pub msg_payload_id: Option<RecordId>,
}

impl MessageRecord {
    /// A new outgoing message in `Queued` state.
    pub fn outgoing(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        created: Timestamp,
    ) -> Self {
        Self {
            id: None,
            belongs_to_me: true,
            read: true,
            status: MessageStatus::Queued,
            to_address: to_address.into(),
            from_address: from_address.into(),
            subject: subject.into(),
            body: body.into(),
            created,
            ack_payload_id: None,
            msg_payload_id: None,
        }
    }

    /// Same sender, recipient, subject and body.
    pub fn same_content(&self, other: &Self) -> bool {
        self.to_address == other.to_address
            && self.from_address == other.from_address
            && self.subject == other.subject
            && self.body == other.body
    }
}

/// A wire-ready object plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    /// Store id.
    pub id: Option<RecordId>,
    /// Object kind.
    pub kind: PayloadKind,
    /// Created by us.
    pub belongs_to_me: bool,
    /// Nonce in `bytes` satisfies the proof of work.
    pub pow_done: bool,
    /// Last time handed to a relay, 0 if never.
    pub last_dissemination: Timestamp,
    /// Owning identity, where one applies.
    pub related_address_id: Option<RecordId>,
    /// Incoming payload already processed.
    pub processing_complete: bool,
    /// An ack we sent out and expect to see again.
    pub awaiting_ack: bool,
    /// Object bytes (network-framed for acks).
    pub bytes: Vec<u8>,
}

impl PayloadRecord {
    /// A new payload created locally.
    pub fn own(kind: PayloadKind, bytes: Vec<u8>, pow_done: bool) -> Self {
        Self {
            id: None,
            kind,
            belongs_to_me: true,
            pow_done,
            last_dissemination: 0,
            related_address_id: None,
            processing_complete: false,
            awaiting_ack: false,
            bytes,
        }
    }

    /// A payload fetched from a relay and not yet processed.
    pub fn incoming(kind: PayloadKind, bytes: Vec<u8>) -> Self {
        Self {
            belongs_to_me: false,
            pow_done: true,
            ..Self::own(kind, bytes, true)
        }
    }

    /// True once handed to a relay.
    pub fn disseminated(&self) -> bool {
        self.last_dissemination != 0
    }
}

/// Number of typed references a queue record can hold.
pub const MAX_QUEUE_REFERENCES: usize = 3;

/// A durable unit of pending work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    /// Store id.
    pub id: Option<RecordId>,
    /// Work to do.
    pub task: TaskKind,
    /// Records the task operates on.
    pub objects: [Option<ObjectRef>; MAX_QUEUE_REFERENCES],
    /// Earliest time the task may run.
    pub trigger_time: Timestamp,
    /// Failed attempts so far.
    pub attempts: u32,
    /// Time of the last attempt, 0 if never.
    pub last_attempt: Timestamp,
    /// 0 for the first send of a message, incremented per resend.
    pub record_count: u32,
}

impl QueueRecord {
    fn with_refs(task: TaskKind, refs: [Option<ObjectRef>; MAX_QUEUE_REFERENCES]) -> Self {
        Self {
            id: None,
            task,
            objects: refs,
            trigger_time: 0,
            attempts: 0,
            last_attempt: 0,
            record_count: 0,
        }
    }

    /// Resolve the recipient pubkey for `message`.
    pub fn send_message(message: RecordId) -> Self {
        Self::with_refs(
            TaskKind::SendMessage,
            [Some(ObjectRef::message(message)), None, None],
        )
    }

    /// Build the msg object for `message` to `pubkey`.
    pub fn process_outgoing(message: RecordId, pubkey: RecordId) -> Self {
        Self::with_refs(
            TaskKind::ProcessOutgoingMessage,
            [
                Some(ObjectRef::message(message)),
                Some(ObjectRef::pubkey(pubkey)),
                None,
            ],
        )
    }

    /// Disseminate the msg `payload` of `message` addressed to `pubkey`.
    pub fn disseminate_message(message: RecordId, payload: RecordId, pubkey: RecordId) -> Self {
        Self::with_refs(
            TaskKind::DisseminateMessage,
            [
                Some(ObjectRef::message(message)),
                Some(ObjectRef::payload(payload)),
                Some(ObjectRef::pubkey(pubkey)),
            ],
        )
    }

    /// Publish the pubkey `payload` of identity `address`.
    pub fn disseminate_pubkey(address: RecordId, payload: RecordId) -> Self {
        Self::with_refs(
            TaskKind::DisseminatePubkey,
            [
                Some(ObjectRef::address(address)),
                Some(ObjectRef::payload(payload)),
                None,
            ],
        )
    }

    /// Publish the ack `payload`.
    pub fn disseminate_ack(payload: RecordId) -> Self {
        Self::with_refs(
            TaskKind::DisseminateAck,
            [Some(ObjectRef::payload(payload)), None, None],
        )
    }

    /// Fetch and process new objects.
    pub fn check_for_messages() -> Self {
        Self::with_refs(TaskKind::CheckForMessages, [None, None, None])
    }

    /// Set the trigger time.
    pub fn triggered_at(mut self, time: Timestamp) -> Self {
        self.trigger_time = time;
        self
    }

    /// Set the record count.
    pub fn with_record_count(mut self, count: u32) -> Self {
        self.record_count = count;
        self
    }

    /// First referenced id of `kind`.
    pub fn reference(&self, kind: RecordKind) -> Option<RecordId> {
        self.objects
            .iter()
            .flatten()
            .find(|r| r.kind == kind)
            .map(|r| r.id)
    }

    /// True if the record points at `target`.
    pub fn references(&self, target: ObjectRef) -> bool {
        self.objects.iter().flatten().any(|r| *r == target)
    }
}

/// A relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Store id.
    pub id: Option<RecordId>,
    /// Endpoint URL.
    pub url: String,
    /// API user.
    pub username: String,
    /// API password.
    pub password: String,
}

impl ServerRecord {
    /// Endpoint with credentials.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            url: url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behaviour_bits() {
        let both = BehaviourBitfield(
            BehaviourBitfield::SENDS_ACKS | BehaviourBitfield::INCLUDE_DESTINATION,
        );
        assert!(both.sends_acks());
        assert!(both.includes_destination());
        assert!(!BehaviourBitfield(0).sends_acks());
        assert_eq!(BehaviourBitfield::standard().to_be_bytes(), [0, 0, 0, 1]);
    }

    #[test]
    fn test_queue_record_references() {
        let record = QueueRecord::disseminate_message(7, 8, 9).triggered_at(100);
        assert_eq!(record.reference(RecordKind::Message), Some(7));
        assert_eq!(record.reference(RecordKind::Payload), Some(8));
        assert_eq!(record.reference(RecordKind::Pubkey), Some(9));
        assert_eq!(record.reference(RecordKind::Address), None);
        assert!(record.references(ObjectRef::payload(8)));
        assert!(!record.references(ObjectRef::message(8)));
        assert_eq!(record.trigger_time, 100);
        assert_eq!(record.attempts, 0);
    }

    #[test]
    fn test_incoming_payload_defaults() {
        let payload = PayloadRecord::incoming(PayloadKind::Msg, vec![1, 2, 3]);
        assert!(!payload.belongs_to_me);
        assert!(!payload.processing_complete);
        assert!(!payload.disseminated());
    }

    #[test]
    fn test_same_content_ignores_metadata() {
        let a = MessageRecord::outgoing("BM-a", "BM-b", "s", "b", 1);
        let mut b = a.clone();
        b.created = 99;
        b.status = MessageStatus::Received;
        assert!(a.same_content(&b));
        b.body.push('!');
        assert!(!a.same_content(&b));
    }

    #[test]
    fn test_pubkey_record_serde_roundtrip() {
        let record = PubkeyRecord {
            id: Some(3),
            belongs_to_me: false,
            ripe: [1; 20],
            tag: [2; 32],
            address_version: 4,
            stream: 1,
            behaviour: BehaviourBitfield::standard(),
            signing_key: [3; 64],
            encryption_key: [4; 64],
            nonce_trials_per_byte: 1000,
            extra_bytes: 1000,
            pow_nonce: 42,
            expiration: 1_700_000_000,
            signature: vec![5; 70],
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: PubkeyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
