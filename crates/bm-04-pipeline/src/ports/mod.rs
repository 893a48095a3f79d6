//! Ports for the message pipeline

pub mod inbound;
pub mod outbound;

pub use inbound::{IncomingSummary, MessagingApi, NewIdentity};
pub use outbound::{
    Connectivity, DisseminationRequest, Notifier, RelayClient, Repository, Store,
};
