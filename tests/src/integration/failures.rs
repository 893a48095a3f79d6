//! # Failure Flows
//!
//! Relay outages, fail-over and retry exhaustion.

#[cfg(test)]
mod tests {
    use crate::harness::{eager_queue, TestNetwork};
    use bm_05_queue::QueueConfig;
    use shared_types::{MessageStatus, TaskKind, TimeSource};

    const STRANGER: &str = "BM-NBniqBpDRZHLx7rVWyyrEf1XmPgSiSrr";

    #[tokio::test]
    async fn test_delivery_fails_over_to_live_relay() {
        let network = TestNetwork::new(3);
        network.relay.set_offline("relay-0", true);
        network.relay.set_offline("relay-1", true);
        let alice = network.node();
        let bob = network.node();
        let alice_id = alice.new_identity("alice").await;
        let bob_id = bob.new_identity("bob").await;

        let id = alice.send(&alice_id, &bob_id, "s", "b").await;
        assert!(network
            .run_until(&[&alice, &bob], 20, || {
                alice.status(id) == MessageStatus::Acknowledged
            })
            .await
            .is_some());
        assert!(network.relay.calls("relay-2") > 0);
        assert_eq!(bob.inbox().len(), 1);
    }

    #[tokio::test]
    async fn test_retries_exhaust_and_fail_message() {
        let network = TestNetwork::new(2);
        network.set_all_offline(true);
        let alice = network.node_with(QueueConfig {
            max_attempts: 3,
            ..eager_queue()
        });
        let alice_id = alice.new_identity("alice").await;
        let id = alice.send(&alice_id, STRANGER, "s", "b").await;

        for attempt in 1..=3 {
            network.step(&[&alice]).await;
            let task = &alice.tasks(TaskKind::SendMessage)[0];
            assert_eq!(task.attempts, attempt);
            assert_eq!(task.last_attempt, network.clock.now());
            assert_eq!(alice.status(id), MessageStatus::RequestingPubkey);
        }

        network.step(&[&alice]).await;
        assert_eq!(alice.status(id), MessageStatus::Failed);
        assert!(alice.all_tasks().is_empty());

        // Nothing left to retry once the network returns.
        network.set_all_offline(false);
        network.step(&[&alice]).await;
        assert_eq!(alice.status(id), MessageStatus::Failed);
    }

    #[tokio::test]
    async fn test_offline_node_waits() {
        let network = TestNetwork::new(1);
        let alice = network.node();
        let bob = network.node();
        let alice_id = alice.new_identity("alice").await;
        let bob_id = bob.new_identity("bob").await;
        network.step(&[&bob]).await;

        alice.connectivity.set_online(false);
        let id = alice.send(&alice_id, &bob_id, "later", "when online").await;
        for _ in 0..3 {
            let reports = network.step(&[&alice]).await;
            assert!(reports[0].offline);
        }
        assert_eq!(alice.status(id), MessageStatus::Queued);
        assert!(alice.all_tasks().iter().all(|t| t.attempts == 0));

        alice.connectivity.set_online(true);
        assert!(network
            .run_until(&[&alice, &bob], 20, || {
                alice.status(id) == MessageStatus::Acknowledged
            })
            .await
            .is_some());
    }
}
