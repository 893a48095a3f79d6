//! Driving Ports (API - Inbound)
//!
//! Entry points the UI and the task queue call.

use crate::error::Result;
use async_trait::async_trait;
use shared_types::{AddressRecord, MessageRecord, RecordId};

/// A freshly created identity.
#[derive(Clone, Debug)]
pub struct NewIdentity {
    /// Stored address record.
    pub address: AddressRecord,
    /// Pubkey payload waiting for dissemination.
    pub pubkey_payload_id: RecordId,
}

/// What one pass over unprocessed incoming payloads produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncomingSummary {
    /// Messages stored and surfaced.
    pub new_messages: Vec<RecordId>,
    /// Our messages whose ack arrived.
    pub acknowledged: Vec<RecordId>,
    /// Ack payloads we must publish for received messages.
    pub acks_to_send: Vec<RecordId>,
    /// Objects dropped as malformed, duplicate or not for us.
    pub discarded: usize,
}

impl IncomingSummary {
    /// Fold another summary into this one.
    pub fn merge(&mut self, other: IncomingSummary) {
        self.new_messages.extend(other.new_messages);
        self.acknowledged.extend(other.acknowledged);
        self.acks_to_send.extend(other.acks_to_send);
        self.discarded += other.discarded;
    }
}

/// Primary messaging API
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Generate and store a new identity with its pubkey payload.
    async fn create_identity(&self, label: &str) -> Result<NewIdentity>;

    /// Validate addresses and store an outgoing message in `Queued` state.
    async fn submit_message(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageRecord>;

    /// Fetch new objects from the relays and process every unprocessed one.
    async fn check_for_messages(&self) -> Result<IncomingSummary>;
}
