//! # Delivery Flows
//!
//! Alice and Bob each run their own store and queue against a shared relay
//! network:
//!
//! ```text
//! Alice ──msg──→ relay ──msg──→ Bob
//!   ↑                            │
//!   └──────── ack ←── relay ←────┘
//! ```

#[cfg(test)]
mod tests {
    use crate::harness::TestNetwork;
    use bm_04_pipeline::MessagingApi;
    use bm_03_objects::ObjectType;
    use shared_types::{MessageStatus, ObjectRef, QueueField, QueueRecord, TaskKind};

    #[tokio::test]
    async fn test_message_is_delivered_and_acknowledged() {
        let network = TestNetwork::new(2);
        let alice = network.node();
        let bob = network.node();
        let alice_id = alice.new_identity("alice").await;
        let bob_id = bob.new_identity("bob").await;

        let id = alice
            .send(&alice_id, &bob_id, "Quarterly numbers", "Attached below.\nRegards")
            .await;

        let steps = network
            .run_until(&[&alice, &bob], 20, || {
                alice.status(id) == MessageStatus::Acknowledged
            })
            .await;
        assert!(steps.is_some(), "ack never arrived");

        let inbox = bob.inbox();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].from_address, alice_id);
        assert_eq!(inbox[0].to_address, bob_id);
        assert_eq!(inbox[0].subject, "Quarterly numbers");
        assert_eq!(inbox[0].body, "Attached below.\nRegards");
        assert_eq!(inbox[0].status, MessageStatus::Received);
        assert_eq!(bob.notifier.messages(), 1);

        // The pending resend was dropped with the ack.
        assert!(alice
            .store
            .queue
            .search(&QueueField::References(ObjectRef::message(id)))
            .unwrap()
            .is_empty());
        assert!(alice.inbox().is_empty());
    }

    #[tokio::test]
    async fn test_resent_message_is_stored_once() {
        let network = TestNetwork::new(1);
        let alice = network.node();
        let bob = network.node();
        let alice_id = alice.new_identity("alice").await;
        let bob_id = bob.new_identity("bob").await;
        network.step(&[&bob]).await;

        let id = alice.send(&alice_id, &bob_id, "twice", "same body").await;
        assert!(network
            .run_until(&[&alice], 10, || alice.status(id) == MessageStatus::AwaitingAck)
            .await
            .is_some());

        // Resend before Bob has seen the first copy.
        let first_payload = alice.store.messages.search_single(id).unwrap().msg_payload_id;
        alice
            .store
            .queue
            .add(QueueRecord::send_message(id).with_record_count(1))
            .unwrap();
        assert!(network
            .run_until(&[&alice], 10, || {
                let message = alice.store.messages.search_single(id).unwrap();
                message.msg_payload_id != first_payload
                    && message.status == MessageStatus::AwaitingAck
            })
            .await
            .is_some());
        assert_eq!(network.relay.objects_of_type(ObjectType::Msg).len(), 2);

        assert!(network
            .run_until(&[&alice, &bob], 20, || {
                alice.status(id) == MessageStatus::Acknowledged
            })
            .await
            .is_some());
        assert_eq!(bob.inbox().len(), 1);
        assert_eq!(bob.notifier.messages(), 1);
    }

    #[tokio::test]
    async fn test_message_to_self() {
        let network = TestNetwork::new(1);
        let node = network.node();
        let me = node.new_identity("me").await;

        let id = node.send(&me, &me, "note", "buy milk").await;
        assert!(network
            .run_until(&[&node], 20, || node.status(id) == MessageStatus::Acknowledged)
            .await
            .is_some());

        let inbox = node.inbox();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].body, "buy milk");
    }

    #[tokio::test]
    async fn test_unknown_recipient_gets_one_getpubkey() {
        let network = TestNetwork::new(1);
        let alice = network.node();
        let bob = network.node();
        let alice_id = alice.new_identity("alice").await;
        // Bob exists but never publishes his pubkey.
        let bob_id = bob
            .pipeline()
            .create_identity("bob")
            .await
            .unwrap()
            .address
            .address;

        let id = alice.send(&alice_id, &bob_id, "hello?", "anyone").await;
        for _ in 0..5 {
            network.step(&[&alice]).await;
        }

        assert_eq!(alice.status(id), MessageStatus::RequestingPubkey);
        assert_eq!(network.relay.objects_of_type(ObjectType::GetPubkey).len(), 1);
        let waiting = alice.tasks(TaskKind::SendMessage);
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].attempts, 5);
        assert!(alice.tasks(TaskKind::ProcessOutgoingMessage).is_empty());
    }
}
