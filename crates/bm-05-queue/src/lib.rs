//! # Task Queue
//!
//! Durable, retrying work list that drives the message pipeline.
//!
//! A message goes through three records, each replaced by the next on
//! success:
//!
//! ```text
//! SendMessage ──pubkey found──→ ProcessOutgoingMessage ──built──→ DisseminateMessage
//!      ↑                                                              │
//!      └──────────── resend at object expiry (ack expected) ──────────┘
//! ```
//!
//! Failures bump `attempts` and keep the record; past `max_attempts` the
//! record is dropped and the message marked failed. Errors that retrying
//! cannot fix (bad address, missing records) fail the chain at once.
//! `DisseminatePubkey`, `DisseminateAck` and `CheckForMessages` run beside
//! the send chain.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod worker;

pub use config::QueueConfig;
pub use domain::{due_records, is_deferred, record_failure, FailureOutcome};
pub use error::{QueueError, Result};
pub use service::{PassReport, QueueProcessor};
pub use worker::{BackgroundWorker, WorkerRequest};
