//! Pass ordering and retry bookkeeping
//!
//! Pure functions over queue records; the processor applies them to the
//! store.

use shared_types::{QueueRecord, RecordKind, TaskKind, Timestamp};

/// What to do with a task after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Keep the record with its counters bumped.
    Retry(QueueRecord),
    /// Too many attempts: drop the record and fail the message.
    GiveUp,
}

/// Records due at `now`, least recently attempted first.
pub fn due_records(mut records: Vec<QueueRecord>, now: Timestamp) -> Vec<QueueRecord> {
    records.retain(|r| r.trigger_time <= now);
    records.sort_by_key(|r| (r.last_attempt, r.id));
    records
}

/// True when a `SendMessage` record must wait for another record of the
/// same message that was triggered earlier.
pub fn is_deferred(record: &QueueRecord, all: &[QueueRecord]) -> bool {
    if record.task != TaskKind::SendMessage {
        return false;
    }
    let Some(message) = record.reference(RecordKind::Message) else {
        return false;
    };
    all.iter().any(|other| {
        other.id != record.id
            && other.reference(RecordKind::Message) == Some(message)
            && (other.trigger_time, other.id) < (record.trigger_time, record.id)
    })
}

/// Count a failed attempt at `now`.
pub fn record_failure(mut record: QueueRecord, now: Timestamp, max_attempts: u32) -> FailureOutcome {
    record.attempts = record.attempts.saturating_add(1);
    record.last_attempt = now;
    if record.attempts > max_attempts {
        FailureOutcome::GiveUp
    } else {
        FailureOutcome::Retry(record)
    }
}
