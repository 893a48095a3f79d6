//! Record construction and lookup keys
//!
//! Pure helpers mapping between decoded objects and stored records.

use bm_01_address::{tag_for, Identity, NetworkAddress};
use bm_02_pow::PowParameters;
use bm_03_objects::ReceivedMsg;
use shared_types::{
    BehaviourBitfield, MessageRecord, MessageStatus, PubkeyField, PubkeyRecord, Timestamp,
};

/// Search key for the pubkey of `address`: ripe up to v3, tag from v4.
pub fn pubkey_field_for(address: &NetworkAddress) -> PubkeyField {
    if address.version() >= 4 {
        PubkeyField::Tag(tag_for(address))
    } else {
        PubkeyField::Ripe(*address.ripe())
    }
}

/// Pubkey record for one of our identities.
pub fn own_pubkey_record(
    identity: &Identity,
    behaviour: BehaviourBitfield,
    pow: PowParameters,
    expiration: Timestamp,
) -> PubkeyRecord {
    let address = identity.address();
    PubkeyRecord {
        id: None,
        belongs_to_me: true,
        ripe: *address.ripe(),
        tag: tag_for(address),
        address_version: address.version(),
        stream: address.stream(),
        behaviour,
        signing_key: identity.signing().public_key().to_bytes(),
        encryption_key: identity.encryption().public_key().to_bytes(),
        nonce_trials_per_byte: pow.nonce_trials_per_byte,
        extra_bytes: pow.extra_bytes,
        pow_nonce: 0,
        expiration,
        signature: Vec::new(),
    }
}

/// Pubkey record for the sender of a received msg.
pub fn sender_pubkey_record(received: &ReceivedMsg) -> PubkeyRecord {
    let msg = &received.msg;
    let pow = msg.pow.unwrap_or(PowParameters::new(
        bm_02_pow::NETWORK_NONCE_TRIALS_PER_BYTE,
        bm_02_pow::NETWORK_EXTRA_BYTES,
    ));
    PubkeyRecord {
        id: None,
        belongs_to_me: false,
        ripe: *received.sender.ripe(),
        tag: tag_for(&received.sender),
        address_version: received.sender.version(),
        stream: received.sender.stream(),
        behaviour: msg.behaviour,
        signing_key: msg.signing_key.to_bytes(),
        encryption_key: msg.encryption_key.to_bytes(),
        nonce_trials_per_byte: pow.nonce_trials_per_byte,
        extra_bytes: pow.extra_bytes,
        pow_nonce: 0,
        expiration: 0,
        signature: Vec::new(),
    }
}

/// Inbox record for a received msg.
pub fn received_message(received: &ReceivedMsg, to: &NetworkAddress, now: Timestamp) -> MessageRecord {
    let text = received.msg.text();
    MessageRecord {
        id: None,
        belongs_to_me: false,
        read: false,
        status: MessageStatus::Received,
        to_address: to.encode(),
        from_address: received.sender.encode(),
        subject: text.subject,
        body: text.body,
        created: now,
        ack_payload_id: None,
        msg_payload_id: None,
    }
}

/// Status once the msg object is on the network.
pub fn status_after_dissemination(expects_ack: bool) -> MessageStatus {
    if expects_ack {
        MessageStatus::AwaitingAck
    } else {
        MessageStatus::Sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bm_01_address::AddressGenerator;

    #[test]
    fn test_lookup_key_by_version() {
        let v4 = NetworkAddress::parse("BM-NBniqBpDRZHLx7rVWyyrEf1XmPgSiSrr").unwrap();
        assert_eq!(pubkey_field_for(&v4), PubkeyField::Tag(tag_for(&v4)));

        let v3 = NetworkAddress::new(3, 1, *v4.ripe()).unwrap();
        assert_eq!(pubkey_field_for(&v3), PubkeyField::Ripe(*v4.ripe()));
    }

    #[test]
    fn test_own_pubkey_matches_identity() {
        let identity = AddressGenerator::default().generate().unwrap();
        let record = own_pubkey_record(
            &identity,
            BehaviourBitfield::standard(),
            PowParameters::new(1000, 1000),
            5,
        );
        assert!(record.belongs_to_me);
        assert_eq!(record.ripe, *identity.address().ripe());
        assert_eq!(record.address_version, 4);
        assert_eq!(
            record.encryption_key,
            identity.encryption().public_key().to_bytes()
        );
    }

    #[test]
    fn test_status_after_dissemination() {
        assert_eq!(status_after_dissemination(true), MessageStatus::AwaitingAck);
        assert_eq!(status_after_dissemination(false), MessageStatus::Sent);
    }
}
