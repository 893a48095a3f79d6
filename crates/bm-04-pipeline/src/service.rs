//! Message Pipeline Service
//!
//! Every step the task queue drives lives here: identity creation, pubkey
//! retrieval, outgoing message construction and dissemination, ack
//! dissemination, and incoming object processing. Each step persists its
//! result before touching the network, so a crash leaves the store in a
//! state the next attempt can resume from.

use crate::adapters::RelayPool;
use crate::config::PipelineConfig;
use crate::domain::{
    own_pubkey_record, pubkey_field_for, received_message, sender_pubkey_record,
    status_after_dissemination, RetrievalResult,
};
use crate::error::{PipelineError, Result};
use crate::ports::inbound::{IncomingSummary, MessagingApi, NewIdentity};
use crate::ports::outbound::{DisseminationRequest, Notifier, Store};
use async_trait::async_trait;
use bm_01_address::{AddressGenerator, Identity, NetworkAddress};
use bm_02_pow::PowParameters;
use bm_03_objects::{
    expiration_of, matches_awaited, parse_getpubkey, unframe, IncomingMsg, MessageText,
    ObjectCodec, ObjectError, PubkeyIdentifier, RawObject, ReceivedMsg, Recipient,
    DEFAULT_STREAM,
};
use shared_types::{
    AddressField, AddressRecord, MessageField, MessageRecord, MessageStatus, ObjectRef,
    PayloadField, PayloadKind, PayloadRecord, PubkeyField, PubkeyRecord, QueueField, RecordId,
    RecordKind, TimeSource, Timestamp,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of handing a msg object to the relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dissemination {
    /// The recipient is expected to send an ack.
    pub expects_ack: bool,
    /// Expiration of the disseminated object.
    pub expiration: Timestamp,
}

/// Result of publishing one of our pubkeys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubkeyDissemination {
    /// Payload that was published (rebuilt when the old one was stale).
    pub payload_id: RecordId,
    /// When it should be published again.
    pub next_due: Timestamp,
}

/// Message pipeline over injected store, relays, notifier and clock.
pub struct MessagePipeline {
    config: PipelineConfig,
    codec: ObjectCodec,
    generator: AddressGenerator,
    store: Store,
    relays: RelayPool,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn TimeSource>,
    last_fetch: AtomicU64,
}

impl MessagePipeline {
    /// Wire the pipeline.
    ///
    /// # Errors
    ///
    /// Rejects identity settings the address codec cannot produce.
    pub fn new(
        config: PipelineConfig,
        codec: ObjectCodec,
        store: Store,
        relays: RelayPool,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        let generator = AddressGenerator::new(config.identities.clone())?;
        Ok(Self {
            config,
            codec,
            generator,
            store,
            relays,
            notifier,
            clock,
            last_fetch: AtomicU64::new(0),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Object codec.
    pub fn codec(&self) -> &ObjectCodec {
        &self.codec
    }

    /// Record store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run a CPU-heavy codec call on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(ObjectCodec) -> std::result::Result<T, ObjectError> + Send + 'static,
    {
        let codec = self.codec.clone();
        Ok(tokio::task::spawn_blocking(move || f(codec)).await??)
    }

    fn identities(&self) -> Result<Vec<(AddressRecord, Identity)>> {
        let mut identities = Vec::new();
        for record in self.store.addresses.all()? {
            match Identity::from_record(&record) {
                Ok(identity) => identities.push((record, identity)),
                Err(e) => warn!(address = %record.address, error = %e, "Skipping unusable identity"),
            }
        }
        Ok(identities)
    }

    fn identity_for(&self, address: &str) -> Result<(AddressRecord, Identity)> {
        let record = self
            .store
            .addresses
            .search(&AddressField::Address(address.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::UnknownIdentity(address.to_string()))?;
        let identity = Identity::from_record(&record)?;
        Ok((record, identity))
    }

    fn parse_recipient(address: &str) -> Result<NetworkAddress> {
        NetworkAddress::parse(address).map_err(|e| PipelineError::InvalidRecipient {
            address: address.to_string(),
            reason: e.to_string(),
        })
    }

    fn set_status(&self, message: &mut MessageRecord, status: MessageStatus) -> Result<()> {
        if message.status != status {
            debug!(id = ?message.id, from = %message.status.as_str(), to = %status.as_str(), "Message status");
            message.status = status;
            self.store.messages.update(message)?;
            self.notifier.data_changed();
        }
        Ok(())
    }

    fn delete_payload_if_present(&self, id: Option<RecordId>) -> Result<()> {
        let Some(id) = id else {
            return Ok(());
        };
        match self.store.payloads.search_single(id) {
            Ok(payload) => Ok(self.store.payloads.delete(&payload)?),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // =========================================================================
    // IDENTITIES
    // =========================================================================

    /// Build a fresh pubkey payload for identity `address_id`, replacing
    /// older ones.
    pub async fn rebuild_pubkey_payload(&self, address_id: RecordId) -> Result<PayloadRecord> {
        let record = self.store.addresses.search_single(address_id)?;
        let identity = Identity::from_record(&record)?;
        let now = self.now();
        let sealed = self
            .blocking(move |codec| codec.build_pubkey(&identity, now))
            .await?;

        for old in self
            .store
            .payloads
            .search(&PayloadField::RelatedAddressId(address_id))?
            .into_iter()
            .filter(|p| p.kind == PayloadKind::Pubkey)
        {
            self.store.payloads.delete(&old)?;
        }

        let mut payload = PayloadRecord::own(PayloadKind::Pubkey, sealed.bytes, sealed.pow_done);
        payload.related_address_id = Some(address_id);
        let id = self.store.payloads.add(payload.clone())?;
        payload.id = Some(id);
        Ok(payload)
    }

    /// Publish our pubkey, rebuilding it when missing or close to expiry.
    #[instrument(skip(self))]
    pub async fn disseminate_pubkey(
        &self,
        address_id: RecordId,
        payload_id: RecordId,
    ) -> Result<PubkeyDissemination> {
        let now = self.now();
        let margin = self.config.pubkey_refresh_margin;
        let existing = match self.store.payloads.search_single(payload_id) {
            Ok(payload) => Some(payload),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };
        let fresh = existing.filter(|p| {
            expiration_of(&p.bytes).map_or(false, |expiration| expiration > now + margin)
        });
        let mut payload = match fresh {
            Some(payload) => payload,
            None => self.rebuild_pubkey_payload(address_id).await?,
        };
        let expiration = expiration_of(&payload.bytes)?;

        self.relays
            .disseminate(&DisseminationRequest {
                bytes: payload.bytes.clone(),
                pow_done: payload.pow_done,
                params: self.codec.pow().network_minimum(),
                expiration,
            })
            .await?;
        payload.last_dissemination = now;
        self.store.payloads.update(&payload)?;

        let payload_id = payload
            .id
            .ok_or(shared_types::StoreError::MissingId(RecordKind::Payload))?;
        info!(address_id, payload_id, "Pubkey disseminated");
        Ok(PubkeyDissemination {
            payload_id,
            next_due: expiration.saturating_sub(margin).max(now + 1),
        })
    }

    // =========================================================================
    // OUTGOING
    // =========================================================================

    /// Find the recipient's pubkey locally, then on the relays, and
    /// otherwise put a getpubkey request on the network.
    #[instrument(skip(self))]
    pub async fn retrieve_pubkey(&self, message_id: RecordId) -> Result<RetrievalResult> {
        let mut message = self.store.messages.search_single(message_id)?;
        let address = Self::parse_recipient(&message.to_address)?;
        if message.status == MessageStatus::Queued {
            self.set_status(&mut message, MessageStatus::RequestingPubkey)?;
        }

        if let Some(pubkey) = self.local_pubkey(&address)? {
            debug!(%address, "Pubkey known locally");
            return Ok(RetrievalResult::Found(pubkey));
        }

        let identifier = PubkeyIdentifier::for_address(&address);
        let now = self.now();
        match self
            .relays
            .request_pubkey(&identifier, address.version())
            .await
        {
            Ok(Some(bytes)) => match self.codec.read_pubkey(&bytes, &address, now) {
                Ok(pubkey) => {
                    let mut record = pubkey.to_record();
                    record.id = Some(self.store.pubkeys.add(record.clone())?);
                    info!(%address, "Pubkey retrieved from relay");
                    self.notifier.data_changed();
                    return Ok(RetrievalResult::Found(record));
                }
                Err(e) => warn!(%address, error = %e, "Relay returned an unusable pubkey"),
            },
            Ok(None) => debug!(%address, "Relays do not have the pubkey yet"),
            Err(e) => warn!(%address, error = %e, "Pubkey request failed"),
        }

        let mut request = self.getpubkey_payload(&address, &identifier, now).await?;
        if !request.disseminated() {
            let expiration = expiration_of(&request.bytes)?;
            self.relays
                .disseminate(&DisseminationRequest {
                    bytes: request.bytes.clone(),
                    pow_done: request.pow_done,
                    params: self.codec.pow().network_minimum(),
                    expiration,
                })
                .await?;
            request.last_dissemination = now;
            self.store.payloads.update(&request)?;
            info!(%address, "Getpubkey disseminated");
        }
        Ok(RetrievalResult::Pending(request))
    }

    fn local_pubkey(&self, address: &NetworkAddress) -> Result<Option<PubkeyRecord>> {
        Ok(self
            .store
            .pubkeys
            .search(&pubkey_field_for(address))?
            .into_iter()
            .find(|p| p.address_version == address.version()))
    }

    /// Live getpubkey payload for `identifier`, reused when one exists.
    async fn getpubkey_payload(
        &self,
        address: &NetworkAddress,
        identifier: &PubkeyIdentifier,
        now: Timestamp,
    ) -> Result<PayloadRecord> {
        for payload in self
            .store
            .payloads
            .search(&PayloadField::Kind(PayloadKind::GetPubkey))?
        {
            let Ok(raw) = RawObject::decode(&payload.bytes) else {
                continue;
            };
            if parse_getpubkey(&raw).ok().as_ref() != Some(identifier) {
                continue;
            }
            if raw.header.expiration > now {
                return Ok(payload);
            }
            self.store.payloads.delete(&payload)?;
        }

        let address = *address;
        let sealed = self
            .blocking(move |codec| codec.build_getpubkey(&address, now))
            .await?;
        let mut payload = PayloadRecord::own(PayloadKind::GetPubkey, sealed.bytes, sealed.pow_done);
        payload.id = Some(self.store.payloads.add(payload.clone())?);
        Ok(payload)
    }

    /// Build the ack and msg objects for `message_id` and persist them.
    ///
    /// `record_count` is 0 for the first send and selects the lifetime.
    #[instrument(skip(self))]
    pub async fn process_outgoing(
        &self,
        message_id: RecordId,
        pubkey_id: RecordId,
        record_count: u32,
    ) -> Result<PayloadRecord> {
        let mut message = self.store.messages.search_single(message_id)?;
        let (sender_record, sender) = self.identity_for(&message.from_address)?;
        let pubkey = self.store.pubkeys.search_single(pubkey_id)?;
        let recipient = Recipient::from_record(&pubkey)?;
        self.set_status(&mut message, MessageStatus::ProcessingOutgoing)?;

        self.delete_payload_if_present(message.msg_payload_id.take())?;
        self.delete_payload_if_present(message.ack_payload_id.take())?;

        let now = self.now();
        let expiration = now + self.config.message_ttl(record_count);
        let stream = recipient.address.stream();

        let ack = if self.codec.config().request_acks {
            Some(
                self.blocking(move |codec| codec.build_ack(stream, expiration, now))
                    .await?,
            )
        } else {
            None
        };
        let embedded = ack.as_ref().map(|a| a.framed.clone()).unwrap_or_default();

        let text = MessageText::new(message.subject.clone(), message.body.clone());
        let sealed = self
            .blocking(move |codec| {
                codec.build_msg(&sender, &recipient, &text, embedded, expiration, now)
            })
            .await?;

        // Nothing is stored until both objects exist.
        if let Some(ack) = ack {
            let mut payload = PayloadRecord::own(PayloadKind::Ack, ack.framed, ack.pow_done);
            payload.awaiting_ack = true;
            payload.related_address_id = sender_record.id;
            message.ack_payload_id = Some(self.store.payloads.add(payload)?);
        }
        let mut payload = PayloadRecord::own(PayloadKind::Msg, sealed.bytes, sealed.pow_done);
        payload.related_address_id = sender_record.id;
        payload.id = Some(self.store.payloads.add(payload.clone())?);

        message.msg_payload_id = payload.id;
        message.status = MessageStatus::Disseminating;
        self.store.messages.update(&message)?;
        self.notifier.data_changed();
        info!(message_id, expiration, pow_done = payload.pow_done, "Outgoing message built");
        Ok(payload)
    }

    /// Hand the msg payload to the relays and update the message status.
    #[instrument(skip(self))]
    pub async fn disseminate_message(
        &self,
        message_id: RecordId,
        payload_id: RecordId,
        pubkey_id: RecordId,
    ) -> Result<Dissemination> {
        let mut message = self.store.messages.search_single(message_id)?;
        let mut payload = self.store.payloads.search_single(payload_id)?;
        let pubkey = self.store.pubkeys.search_single(pubkey_id)?;
        let expiration = expiration_of(&payload.bytes)?;
        let params = self.codec.pow().effective_parameters(Some(PowParameters::new(
            pubkey.nonce_trials_per_byte,
            pubkey.extra_bytes,
        )));

        self.relays
            .disseminate(&DisseminationRequest {
                bytes: payload.bytes.clone(),
                pow_done: payload.pow_done,
                params,
                expiration,
            })
            .await?;

        payload.last_dissemination = self.now();
        self.store.payloads.update(&payload)?;

        let expects_ack = message.ack_payload_id.is_some() && pubkey.behaviour.sends_acks();
        self.set_status(&mut message, status_after_dissemination(expects_ack))?;
        info!(message_id, expects_ack, "Message disseminated");
        Ok(Dissemination {
            expects_ack,
            expiration,
        })
    }

    /// Mark a message permanently failed. Returns false if it already was
    /// or no longer exists.
    pub fn mark_failed(&self, message_id: RecordId) -> Result<bool> {
        let mut message = match self.store.messages.search_single(message_id) {
            Ok(message) => message,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if message.status == MessageStatus::Failed {
            return Ok(false);
        }
        self.set_status(&mut message, MessageStatus::Failed)?;
        Ok(true)
    }

    // =========================================================================
    // ACKS
    // =========================================================================

    /// Publish an ack for a message we received, then forget it.
    #[instrument(skip(self))]
    pub async fn disseminate_ack(&self, payload_id: RecordId) -> Result<()> {
        let payload = self.store.payloads.search_single(payload_id)?;
        let object = unframe(&payload.bytes)?;
        let expiration = expiration_of(object)?;
        let now = self.now();
        let minimum = self.codec.pow().network_minimum();
        let pow_done = self.codec.pow().verify(object, minimum, now).unwrap_or(false);

        self.relays
            .disseminate(&DisseminationRequest {
                bytes: object.to_vec(),
                pow_done,
                params: minimum,
                expiration,
            })
            .await?;
        self.store.payloads.delete(&payload)?;
        debug!(payload_id, "Ack disseminated");
        Ok(())
    }

    /// Mark the message acknowledged by `object`, if it is one we await.
    fn match_ack(&self, object: &[u8]) -> Result<Option<RecordId>> {
        for awaited in self.store.payloads.search(&PayloadField::AwaitingAck(true))? {
            if !matches_awaited(&awaited.bytes, object) {
                continue;
            }
            let Some(ack_id) = awaited.id else { continue };
            let mut acknowledged = None;
            for mut message in self.store.messages.search(&MessageField::AckPayloadId(ack_id))? {
                self.set_status(&mut message, MessageStatus::Acknowledged)?;
                if let Some(id) = message.id {
                    for task in self
                        .store
                        .queue
                        .search(&QueueField::References(ObjectRef::message(id)))?
                    {
                        self.store.queue.delete(&task)?;
                    }
                    acknowledged = Some(id);
                }
            }
            self.store.payloads.delete(&awaited)?;
            info!(message = ?acknowledged, "Ack received");
            return Ok(acknowledged);
        }
        Ok(None)
    }

    // =========================================================================
    // INCOMING
    // =========================================================================

    /// Store msg objects the relays received since the last fetch.
    #[instrument(skip(self))]
    pub async fn fetch_objects(&self) -> Result<usize> {
        let now = self.now();
        let since = match self.last_fetch.load(Ordering::SeqCst) {
            0 => now.saturating_sub(self.config.initial_fetch_lookback),
            last => last,
        };
        let objects = self
            .relays
            .check_for_new_objects(DEFAULT_STREAM, since, now + 1)
            .await?;

        let mut stored = 0;
        for bytes in objects {
            // Our own objects come back too; a message to ourselves must
            // still be opened.
            if self
                .store
                .payloads
                .search(&PayloadField::Bytes(bytes.clone()))?
                .iter()
                .any(|p| !p.belongs_to_me)
            {
                continue;
            }
            self.store
                .payloads
                .add(PayloadRecord::incoming(PayloadKind::Msg, bytes))?;
            stored += 1;
        }
        self.last_fetch.store(now, Ordering::SeqCst);
        debug!(stored, since, "Fetched new objects");
        Ok(stored)
    }

    /// Process every unprocessed incoming msg payload.
    #[instrument(skip(self))]
    pub async fn process_incoming(&self) -> Result<IncomingSummary> {
        let identities = self.identities()?;
        let keys: Vec<Identity> = identities.iter().map(|(_, i)| i.clone()).collect();
        let now = self.now();
        let mut summary = IncomingSummary::default();

        let pending = self
            .store
            .payloads
            .search(&PayloadField::ProcessingComplete(false))?
            .into_iter()
            .filter(|p| p.kind == PayloadKind::Msg && !p.belongs_to_me);

        for mut payload in pending {
            match self.codec.open_msg(&payload.bytes, &keys, now) {
                Ok(IncomingMsg::Ack) => match self.match_ack(&payload.bytes)? {
                    Some(id) => summary.acknowledged.push(id),
                    None => summary.discarded += 1,
                },
                Ok(IncomingMsg::Message(received)) => {
                    let (record, _) = &identities[received.recipient];
                    let (new_message, ack) = self.accept_message(&received, record, now)?;
                    match new_message {
                        Some(id) => summary.new_messages.push(id),
                        None => summary.discarded += 1,
                    }
                    summary.acks_to_send.extend(ack);
                }
                Err(e) if e.is_not_for_me() => {
                    debug!(error = %e, "Object not for us");
                    summary.discarded += 1;
                }
                Err(e) if e.is_malformed() => {
                    debug!(error = %e, "Discarding malformed object");
                    summary.discarded += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Discarding unusable object");
                    summary.discarded += 1;
                }
            }
            payload.processing_complete = true;
            self.store.payloads.update(&payload)?;
        }

        if !summary.new_messages.is_empty() {
            self.notifier.new_messages(summary.new_messages.len());
        }
        if !summary.new_messages.is_empty() || !summary.acknowledged.is_empty() {
            self.notifier.data_changed();
        }
        Ok(summary)
    }

    /// Store a decrypted message unless it is a duplicate; keep its ack
    /// for dissemination either way.
    fn accept_message(
        &self,
        received: &ReceivedMsg,
        recipient: &AddressRecord,
        now: Timestamp,
    ) -> Result<(Option<RecordId>, Option<RecordId>)> {
        let to = NetworkAddress::parse(&recipient.address)?;
        let record = received_message(received, &to, now);

        let ack = self.keep_ack(&received.msg.ack, recipient.id)?;

        let duplicate = self
            .store
            .messages
            .search(&MessageField::ToAddress(record.to_address.clone()))?
            .iter()
            .any(|m| !m.belongs_to_me && m.same_content(&record));
        if duplicate {
            debug!(from = %record.from_address, "Duplicate message dropped");
            return Ok((None, ack));
        }

        if self
            .store
            .pubkeys
            .search(&PubkeyField::Ripe(*received.sender.ripe()))?
            .is_empty()
        {
            self.store.pubkeys.add(sender_pubkey_record(received))?;
        }
        let id = self.store.messages.add(record)?;
        info!(id, from = %received.sender, "Message received");
        Ok((Some(id), ack))
    }

    fn keep_ack(&self, ack: &[u8], recipient_id: Option<RecordId>) -> Result<Option<RecordId>> {
        if ack.is_empty() || !self.codec.behaviour().sends_acks() {
            return Ok(None);
        }
        if let Err(e) = unframe(ack) {
            debug!(error = %e, "Embedded ack is malformed");
            return Ok(None);
        }
        // An awaited copy means we sent this message to ourselves.
        if self
            .store
            .payloads
            .search(&PayloadField::Bytes(ack.to_vec()))?
            .iter()
            .any(|p| !p.awaiting_ack)
        {
            return Ok(None);
        }
        let mut payload = PayloadRecord::own(PayloadKind::Ack, ack.to_vec(), true);
        payload.related_address_id = recipient_id;
        Ok(Some(self.store.payloads.add(payload)?))
    }
}

#[async_trait]
impl MessagingApi for MessagePipeline {
    #[instrument(skip(self))]
    async fn create_identity(&self, label: &str) -> Result<NewIdentity> {
        let identity = self.generator.generate()?;
        let now = self.now();
        let mut address = identity.to_record(label, now);
        let address_id = self.store.addresses.add(address.clone())?;
        address.id = Some(address_id);

        self.store.pubkeys.add(own_pubkey_record(
            &identity,
            self.codec.behaviour(),
            self.codec.pow().network_minimum(),
            now + self.codec.config().pubkey_ttl,
        ))?;
        let payload = self.rebuild_pubkey_payload(address_id).await?;
        let pubkey_payload_id = payload
            .id
            .ok_or(shared_types::StoreError::MissingId(RecordKind::Payload))?;

        info!(address = %address.address, "Identity created");
        self.notifier.data_changed();
        Ok(NewIdentity {
            address,
            pubkey_payload_id,
        })
    }

    #[instrument(skip(self, subject, body))]
    async fn submit_message(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<MessageRecord> {
        self.identity_for(from)?;
        Self::parse_recipient(to)?;
        let mut message = MessageRecord::outgoing(from, to, subject, body, self.now());
        message.id = Some(self.store.messages.add(message.clone())?);
        self.notifier.data_changed();
        Ok(message)
    }

    async fn check_for_messages(&self) -> Result<IncomingSummary> {
        self.fetch_objects().await?;
        self.process_incoming().await
    }
}
