//! # Record Trait and Search Fields
//!
//! A `Record` knows its kind, carries its own id, and can answer whether it
//! matches a typed search field. Storage adapters only need these three
//! capabilities to implement `search` generically.

use crate::entities::*;
use std::fmt::Debug;

/// A persistable entity.
pub trait Record: Clone + Debug + Send + Sync + 'static {
    /// Typed search criterion for this record.
    type Field: Clone + Debug + Send + Sync;

    /// Table this record lives in.
    const KIND: RecordKind;

    /// Store id, `None` until added.
    fn id(&self) -> Option<RecordId>;

    /// Assign the store id.
    fn set_id(&mut self, id: RecordId);

    /// True when this record satisfies `field`.
    fn matches(&self, field: &Self::Field) -> bool;
}

/// Search fields for `AddressRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressField {
    /// Exact `BM-` string.
    Address(String),
    /// Ripe hash.
    Ripe(Ripe),
    /// Address tag.
    Tag(Tag),
}

/// Search fields for `PubkeyRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubkeyField {
    /// Ripe hash.
    Ripe(Ripe),
    /// Address tag.
    Tag(Tag),
    /// Ownership flag.
    BelongsToMe(bool),
}

/// Search fields for `MessageRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageField {
    /// Recipient address.
    ToAddress(String),
    /// Sender address.
    FromAddress(String),
    /// Delivery status.
    Status(MessageStatus),
    /// Ack payload reference.
    AckPayloadId(RecordId),
    /// Msg payload reference.
    MsgPayloadId(RecordId),
    /// Ownership flag.
    BelongsToMe(bool),
}

/// Search fields for `PayloadRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadField {
    /// Object kind.
    Kind(PayloadKind),
    /// Ownership flag.
    BelongsToMe(bool),
    /// Incoming payload processed.
    ProcessingComplete(bool),
    /// Awaited-ack flag.
    AwaitingAck(bool),
    /// Exact object bytes.
    Bytes(Vec<u8>),
    /// Owning identity.
    RelatedAddressId(RecordId),
}

/// Search fields for `QueueRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueField {
    /// Task kind.
    Task(TaskKind),
    /// Any reference slot equals this.
    References(ObjectRef),
}

/// Search fields for `ServerRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerField {
    /// Endpoint URL.
    Url(String),
}

macro_rules! record_identity {
    ($kind:expr) => {
        const KIND: RecordKind = $kind;

        fn id(&self) -> Option<RecordId> {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    };
}

impl Record for AddressRecord {
    type Field = AddressField;
    record_identity!(RecordKind::Address);

    fn matches(&self, field: &AddressField) -> bool {
        match field {
            AddressField::Address(a) => &self.address == a,
            AddressField::Ripe(r) => &self.ripe == r,
            AddressField::Tag(t) => &self.tag == t,
        }
    }
}

impl Record for PubkeyRecord {
    type Field = PubkeyField;
    record_identity!(RecordKind::Pubkey);

    fn matches(&self, field: &PubkeyField) -> bool {
        match field {
            PubkeyField::Ripe(r) => &self.ripe == r,
            PubkeyField::Tag(t) => &self.tag == t,
            PubkeyField::BelongsToMe(b) => self.belongs_to_me == *b,
        }
    }
}

impl Record for MessageRecord {
    type Field = MessageField;
    record_identity!(RecordKind::Message);

    fn matches(&self, field: &MessageField) -> bool {
        match field {
            MessageField::ToAddress(a) => &self.to_address == a,
            MessageField::FromAddress(a) => &self.from_address == a,
            MessageField::Status(s) => self.status == *s,
            MessageField::AckPayloadId(id) => self.ack_payload_id == Some(*id),
            MessageField::MsgPayloadId(id) => self.msg_payload_id == Some(*id),
            MessageField::BelongsToMe(b) => self.belongs_to_me == *b,
        }
    }
}

impl Record for PayloadRecord {
    type Field = PayloadField;
    record_identity!(RecordKind::Payload);

    fn matches(&self, field: &PayloadField) -> bool {
        match field {
            PayloadField::Kind(k) => self.kind == *k,
            PayloadField::BelongsToMe(b) => self.belongs_to_me == *b,
            PayloadField::ProcessingComplete(b) => self.processing_complete == *b,
            PayloadField::AwaitingAck(b) => self.awaiting_ack == *b,
            PayloadField::Bytes(bytes) => &self.bytes == bytes,
            PayloadField::RelatedAddressId(id) => self.related_address_id == Some(*id),
        }
    }
}

impl Record for QueueRecord {
    type Field = QueueField;
    record_identity!(RecordKind::Queue);

    fn matches(&self, field: &QueueField) -> bool {
        match field {
            QueueField::Task(t) => self.task == *t,
            QueueField::References(r) => self.references(*r),
        }
    }
}

impl Record for ServerRecord {
    type Field = ServerField;
    record_identity!(RecordKind::Server);

    fn matches(&self, field: &ServerField) -> bool {
        match field {
            ServerField::Url(u) => &self.url == u,
        }
    }
}
