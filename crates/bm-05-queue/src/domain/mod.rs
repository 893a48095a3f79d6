//! Queue domain: pass ordering and failure accounting

pub mod schedule;

pub use schedule::{due_records, is_deferred, record_failure, FailureOutcome};
