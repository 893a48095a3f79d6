//! Outbound Ports (Driven Ports)
//!
//! What the pipeline needs from the outside world: a record store, relay
//! servers, a connectivity check and a way to tell the UI something
//! changed.

use crate::error::TransportError;
use async_trait::async_trait;
use bm_02_pow::PowParameters;
use bm_03_objects::PubkeyIdentifier;
use shared_types::{
    AddressRecord, MessageRecord, PayloadRecord, PubkeyRecord, QueueRecord, Record, RecordId,
    ServerRecord, StoreError, Timestamp,
};
use std::sync::Arc;

/// Persistence for one record type.
///
/// Mutations are record-level; callers read, modify and write back a
/// single row.
pub trait Repository<R: Record>: Send + Sync {
    /// Insert and return the assigned id.
    fn add(&self, record: R) -> Result<RecordId, StoreError>;

    /// Overwrite the row with `record.id()`.
    fn update(&self, record: &R) -> Result<(), StoreError>;

    /// Remove the row with `record.id()`.
    fn delete(&self, record: &R) -> Result<(), StoreError>;

    /// All rows matching `field`, in id order.
    fn search(&self, field: &R::Field) -> Result<Vec<R>, StoreError>;

    /// Row with `id`, or `StoreError::NotFound`.
    fn search_single(&self, id: RecordId) -> Result<R, StoreError>;

    /// Every row, in id order.
    fn all(&self) -> Result<Vec<R>, StoreError>;
}

/// One repository per record type.
#[derive(Clone)]
pub struct Store {
    /// Own identities.
    pub addresses: Arc<dyn Repository<AddressRecord>>,
    /// Own and remote pubkeys.
    pub pubkeys: Arc<dyn Repository<PubkeyRecord>>,
    /// Sent and received messages.
    pub messages: Arc<dyn Repository<MessageRecord>>,
    /// Wire-ready objects.
    pub payloads: Arc<dyn Repository<PayloadRecord>>,
    /// Pending tasks.
    pub queue: Arc<dyn Repository<QueueRecord>>,
    /// Relay endpoints.
    pub servers: Arc<dyn Repository<ServerRecord>>,
}

/// Object handed to a relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisseminationRequest {
    /// Object bytes.
    pub bytes: Vec<u8>,
    /// Nonce already satisfies `params`.
    pub pow_done: bool,
    /// Difficulty the relay must meet when `pow_done` is false.
    pub params: PowParameters,
    /// Envelope expiration.
    pub expiration: Timestamp,
}

/// Relay server API, one call per server.
#[async_trait]
pub trait RelayClient: Send + Sync {
    /// Publish an object.
    async fn disseminate(
        &self,
        server: &ServerRecord,
        request: &DisseminationRequest,
    ) -> Result<(), TransportError>;

    /// Ask for the newest pubkey object matching `identifier`.
    async fn request_pubkey(
        &self,
        server: &ServerRecord,
        identifier: &PubkeyIdentifier,
        address_version: u64,
    ) -> Result<Option<Vec<u8>>, TransportError>;

    /// Msg objects in `stream` received between `since` and `before`.
    async fn check_for_new_objects(
        &self,
        server: &ServerRecord,
        stream: u64,
        since: Timestamp,
        before: Timestamp,
    ) -> Result<Vec<Vec<u8>>, TransportError>;
}

/// Network availability.
pub trait Connectivity: Send + Sync {
    /// True when relay calls are worth attempting.
    fn internet_available(&self) -> bool;
}

/// Fire-and-forget UI signals.
pub trait Notifier: Send + Sync {
    /// Stored data changed.
    fn data_changed(&self);

    /// `count` new messages arrived.
    fn new_messages(&self, count: usize);
}
