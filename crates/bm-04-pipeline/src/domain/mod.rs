//! Pipeline domain: retrieval outcome and record mapping

pub mod records;
pub mod retrieval;

pub use records::{
    own_pubkey_record, pubkey_field_for, received_message, sender_pubkey_record,
    status_after_dissemination,
};
pub use retrieval::RetrievalResult;
