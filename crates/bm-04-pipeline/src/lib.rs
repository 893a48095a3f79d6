//! # Message Pipeline
//!
//! Drives messages between local identities and the relay network.
//!
//! ## Outgoing
//!
//! 1. `retrieve_pubkey`: local store, then relays, then a getpubkey request
//! 2. `process_outgoing`: build the ack and the encrypted msg, persist both
//! 3. `disseminate_message`: hand the msg to the first relay that accepts
//!
//! ## Incoming
//!
//! `check_for_messages` fetches msg objects received since the last fetch,
//! then classifies each as an ack for one of our messages, a message for one
//! of our identities, or noise. Received messages that carry an ack leave
//! an ack payload behind for the task queue to publish.
//!
//! ## Relays
//!
//! [`adapters::RelayPool`] walks every stored server from a random start
//! and fails over on error; only when every server failed does a call
//! surface `TransportError::Exhausted`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{
    CountingNotifier, InMemoryRepository, LogNotifier, MemoryRelay, RelayPool, ServerRotation,
    StaticConnectivity,
};
pub use config::PipelineConfig;
pub use domain::RetrievalResult;
pub use error::{PipelineError, Result, TransportError};
pub use ports::{
    Connectivity, DisseminationRequest, IncomingSummary, MessagingApi, NewIdentity,
    Notifier, RelayClient, Repository, Store,
};
pub use service::{Dissemination, MessagePipeline, PubkeyDissemination};
