//! Queue Processor
//!
//! Runs due queue records against the message pipeline. A task that
//! succeeds is replaced by its successor; the successor is written before
//! the finished record is deleted so a crash in between repeats a step
//! instead of losing the chain.

use crate::config::QueueConfig;
use crate::domain::{due_records, is_deferred, record_failure, FailureOutcome};
use crate::error::{QueueError, Result};
use bm_04_pipeline::{
    Connectivity, MessagePipeline, MessagingApi, NewIdentity, RetrievalResult, Store,
};
use shared_types::{
    QueueField, QueueRecord, RecordId, RecordKind, TaskKind, TimeSource, Timestamp,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What one pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Pass skipped because the network is unavailable.
    pub offline: bool,
    /// Tasks that ran to completion.
    pub completed: usize,
    /// Tasks that failed and stay queued.
    pub retried: usize,
    /// Tasks dropped for good.
    pub abandoned: usize,
    /// `SendMessage` tasks left for a later pass.
    pub deferred: usize,
}

/// Drives queued tasks through the pipeline.
pub struct QueueProcessor {
    config: QueueConfig,
    pipeline: Arc<MessagePipeline>,
    connectivity: Arc<dyn Connectivity>,
    clock: Arc<dyn TimeSource>,
}

impl QueueProcessor {
    /// Create a processor over `pipeline`'s store.
    pub fn new(
        config: QueueConfig,
        pipeline: Arc<MessagePipeline>,
        connectivity: Arc<dyn Connectivity>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            pipeline,
            connectivity,
            clock,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// The pipeline tasks run against.
    pub fn pipeline(&self) -> &Arc<MessagePipeline> {
        &self.pipeline
    }

    fn store(&self) -> &Store {
        self.pipeline.store()
    }

    fn add(&self, record: QueueRecord) -> Result<RecordId> {
        debug!(task = %record.task, trigger = record.trigger_time, "Queueing task");
        Ok(self.store().queue.add(record)?)
    }

    // =========================================================================
    // SCHEDULING
    // =========================================================================

    /// Queue delivery of a stored outgoing message.
    pub fn enqueue_message(&self, message_id: RecordId) -> Result<RecordId> {
        self.add(QueueRecord::send_message(message_id))
    }

    /// Queue publication of a freshly created identity's pubkey.
    pub fn enqueue_identity(&self, identity: &NewIdentity) -> Result<RecordId> {
        let address_id = identity.address.id.ok_or(QueueError::MissingReference {
            task: TaskKind::DisseminatePubkey,
            kind: RecordKind::Address,
        })?;
        self.add(QueueRecord::disseminate_pubkey(
            address_id,
            identity.pubkey_payload_id,
        ))
    }

    /// Queue a relay poll unless one is already queued.
    pub fn ensure_polling(&self) -> Result<Option<RecordId>> {
        if self
            .store()
            .queue
            .search(&QueueField::Task(TaskKind::CheckForMessages))?
            .is_empty()
        {
            return self.add(QueueRecord::check_for_messages()).map(Some);
        }
        Ok(None)
    }

    // =========================================================================
    // PASS
    // =========================================================================

    /// Run every due task once.
    #[instrument(skip(self))]
    pub async fn run_pass(&self) -> Result<PassReport> {
        let mut report = PassReport::default();
        if !self.connectivity.internet_available() {
            debug!("No internet, skipping queue pass");
            report.offline = true;
            return Ok(report);
        }

        let now = self.clock.now();
        let all = self.store().queue.all()?;
        for record in due_records(all.clone(), now) {
            let Some(id) = record.id else { continue };
            if is_deferred(&record, &all) {
                report.deferred += 1;
                continue;
            }
            // Earlier tasks in this pass may have removed it (acks do).
            let record = match self.store().queue.search_single(id) {
                Ok(record) => record,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };

            match self.run_task(&record, now).await {
                Ok(()) => report.completed += 1,
                Err(e) if e.is_retryable() => {
                    if self.retry(record, now, &e)? {
                        report.retried += 1;
                    } else {
                        report.abandoned += 1;
                    }
                }
                Err(e) => {
                    warn!(id, task = %record.task, error = %e, "Abandoning task");
                    self.abandon(&record)?;
                    report.abandoned += 1;
                }
            }
        }

        if report != PassReport::default() {
            info!(?report, "Queue pass finished");
        }
        Ok(report)
    }

    /// Bump the attempt counters; returns false when the task was given up.
    fn retry(&self, record: QueueRecord, now: Timestamp, error: &QueueError) -> Result<bool> {
        match record_failure(record.clone(), now, self.config.max_attempts) {
            FailureOutcome::Retry(updated) => {
                debug!(id = ?updated.id, task = %updated.task, attempts = updated.attempts, error = %error, "Task failed, will retry");
                self.store().queue.update(&updated)?;
                Ok(true)
            }
            FailureOutcome::GiveUp => {
                warn!(id = ?record.id, task = %record.task, error = %error, "Task exceeded retry limit");
                self.abandon(&record)?;
                Ok(false)
            }
        }
    }

    /// Drop a task and fail the message it was delivering, if any.
    fn abandon(&self, record: &QueueRecord) -> Result<()> {
        if let Some(message_id) = record.reference(RecordKind::Message) {
            if self.pipeline.mark_failed(message_id)? {
                info!(message_id, "Message delivery failed");
            }
        }
        self.delete(record)
    }

    fn delete(&self, record: &QueueRecord) -> Result<()> {
        match self.store().queue.delete(record) {
            Err(e) if !e.is_not_found() => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Queue `next` and then remove `done`.
    fn advance(&self, done: &QueueRecord, next: QueueRecord) -> Result<()> {
        self.add(next)?;
        self.delete(done)
    }

    fn reference(record: &QueueRecord, kind: RecordKind) -> Result<RecordId> {
        record
            .reference(kind)
            .ok_or(QueueError::MissingReference {
                task: record.task,
                kind,
            })
    }

    #[instrument(skip_all, fields(id = ?record.id, task = %record.task))]
    async fn run_task(&self, record: &QueueRecord, now: Timestamp) -> Result<()> {
        match record.task {
            TaskKind::SendMessage => {
                let message_id = Self::reference(record, RecordKind::Message)?;
                let message = self.store().messages.search_single(message_id)?;
                if message.status.is_terminal() {
                    debug!(message_id, status = %message.status.as_str(), "Message settled, dropping task");
                    return self.delete(record);
                }
                match self.pipeline.retrieve_pubkey(message_id).await? {
                    RetrievalResult::Found(pubkey) => {
                        let pubkey_id = pubkey
                            .id
                            .ok_or(shared_types::StoreError::MissingId(RecordKind::Pubkey))?;
                        self.advance(
                            record,
                            QueueRecord::process_outgoing(message_id, pubkey_id)
                                .with_record_count(record.record_count),
                        )
                    }
                    RetrievalResult::Pending(_) => {
                        debug!(message_id, "Waiting for recipient pubkey");
                        let waiting = match record_failure(record.clone(), now, self.config.max_attempts) {
                            FailureOutcome::Retry(updated) => updated,
                            FailureOutcome::GiveUp => {
                                warn!(message_id, "Recipient pubkey never arrived");
                                return self.abandon(record);
                            }
                        };
                        Ok(self.store().queue.update(&waiting)?)
                    }
                }
            }
            TaskKind::ProcessOutgoingMessage => {
                let message_id = Self::reference(record, RecordKind::Message)?;
                let pubkey_id = Self::reference(record, RecordKind::Pubkey)?;
                let payload = self
                    .pipeline
                    .process_outgoing(message_id, pubkey_id, record.record_count)
                    .await?;
                let payload_id = payload
                    .id
                    .ok_or(shared_types::StoreError::MissingId(RecordKind::Payload))?;
                self.advance(
                    record,
                    QueueRecord::disseminate_message(message_id, payload_id, pubkey_id)
                        .with_record_count(record.record_count),
                )
            }
            TaskKind::DisseminateMessage => {
                let message_id = Self::reference(record, RecordKind::Message)?;
                let payload_id = Self::reference(record, RecordKind::Payload)?;
                let pubkey_id = Self::reference(record, RecordKind::Pubkey)?;
                let outcome = self
                    .pipeline
                    .disseminate_message(message_id, payload_id, pubkey_id)
                    .await?;
                if outcome.expects_ack {
                    self.advance(
                        record,
                        QueueRecord::send_message(message_id)
                            .triggered_at(outcome.expiration)
                            .with_record_count(record.record_count + 1),
                    )
                } else {
                    self.delete(record)
                }
            }
            TaskKind::DisseminatePubkey => {
                let address_id = Self::reference(record, RecordKind::Address)?;
                let payload_id = Self::reference(record, RecordKind::Payload)?;
                let published = self.pipeline.disseminate_pubkey(address_id, payload_id).await?;
                self.advance(
                    record,
                    QueueRecord::disseminate_pubkey(address_id, published.payload_id)
                        .triggered_at(published.next_due),
                )
            }
            TaskKind::DisseminateAck => {
                let payload_id = Self::reference(record, RecordKind::Payload)?;
                self.pipeline.disseminate_ack(payload_id).await?;
                self.delete(record)
            }
            TaskKind::CheckForMessages => {
                let summary = self.pipeline.check_for_messages().await?;
                for payload_id in summary.acks_to_send {
                    self.add(QueueRecord::disseminate_ack(payload_id))?;
                }
                self.advance(
                    record,
                    QueueRecord::check_for_messages()
                        .triggered_at(now + self.config.check_interval_secs),
                )
            }
        }
    }
}
