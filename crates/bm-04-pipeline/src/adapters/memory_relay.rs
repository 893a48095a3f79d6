//! In-process relay network
//!
//! Holds every disseminated object with its receipt time and answers the
//! three relay calls from that list. Individual servers can be switched
//! off to exercise fail-over. Objects sent without proof of work are
//! solved here, as a real relay would.

use crate::error::TransportError;
use crate::ports::outbound::{DisseminationRequest, RelayClient};
use async_trait::async_trait;
use bm_01_address::ripe_from_keys;
use bm_02_pow::PowEngine;
use bm_03_objects::{ObjectType, PubkeyIdentifier, RawObject};
use parking_lot::Mutex;
use shared_crypto::PublicKey;
use shared_types::{ServerRecord, TimeSource, Timestamp};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredObject {
    received: Timestamp,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct RelayState {
    objects: Vec<StoredObject>,
    offline: HashSet<String>,
    calls: HashMap<String, usize>,
}

/// Shared in-memory relay network.
pub struct MemoryRelay {
    state: Mutex<RelayState>,
    clock: Arc<dyn TimeSource>,
    pow: PowEngine,
}

impl MemoryRelay {
    /// Empty network; `pow` completes objects sent without a nonce.
    pub fn new(clock: Arc<dyn TimeSource>, pow: PowEngine) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            clock,
            pow,
        }
    }

    /// Make `url` fail every call (or work again).
    pub fn set_offline(&self, url: &str, offline: bool) {
        let mut state = self.state.lock();
        if offline {
            state.offline.insert(url.to_string());
        } else {
            state.offline.remove(url);
        }
    }

    /// Calls made against `url` so far.
    pub fn calls(&self, url: &str) -> usize {
        self.state.lock().calls.get(url).copied().unwrap_or(0)
    }

    /// Every stored object.
    pub fn objects(&self) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .objects
            .iter()
            .map(|o| o.bytes.clone())
            .collect()
    }

    /// Stored objects of `object_type`.
    pub fn objects_of_type(&self, object_type: ObjectType) -> Vec<Vec<u8>> {
        self.objects()
            .into_iter()
            .filter(|bytes| {
                RawObject::decode(bytes).map_or(false, |raw| raw.header.object_type == object_type)
            })
            .collect()
    }

    /// Store an object as if another node had published it.
    pub fn inject(&self, bytes: Vec<u8>) {
        let received = self.clock.now();
        self.store(bytes, received);
    }

    fn store(&self, bytes: Vec<u8>, received: Timestamp) {
        let mut state = self.state.lock();
        if state.objects.iter().any(|o| o.bytes == bytes) {
            return;
        }
        state.objects.push(StoredObject { received, bytes });
    }

    fn enter(&self, server: &ServerRecord) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        *state.calls.entry(server.url.clone()).or_default() += 1;
        if state.offline.contains(&server.url) {
            return Err(TransportError::Unreachable {
                url: server.url.clone(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }
}

fn pubkey_matches(raw: &RawObject<'_>, identifier: &PubkeyIdentifier) -> bool {
    let payload = raw.payload();
    match identifier {
        PubkeyIdentifier::Tag(tag) => payload.len() >= 32 && payload[..32] == tag[..],
        PubkeyIdentifier::Ripe(ripe) => {
            if payload.len() < 132 {
                return false;
            }
            match (
                PublicKey::from_bytes(&payload[4..68]),
                PublicKey::from_bytes(&payload[68..132]),
            ) {
                (Ok(signing), Ok(encryption)) => ripe_from_keys(&signing, &encryption) == *ripe,
                _ => false,
            }
        }
    }
}

#[async_trait]
impl RelayClient for MemoryRelay {
    async fn disseminate(
        &self,
        server: &ServerRecord,
        request: &DisseminationRequest,
    ) -> Result<(), TransportError> {
        self.enter(server)?;
        if RawObject::decode(&request.bytes).is_err() {
            return Err(TransportError::Rejected {
                url: server.url.clone(),
                reason: "malformed object".into(),
            });
        }
        let now = self.clock.now();

        let bytes = if request.pow_done {
            request.bytes.clone()
        } else {
            let pow = self.pow.clone();
            let body = request.bytes[8..].to_vec();
            let (expiration, params) = (request.expiration, request.params);
            tokio::task::spawn_blocking(move || pow.seal(&body, expiration, params, now))
                .await
                .map_err(|e| TransportError::Rejected {
                    url: server.url.clone(),
                    reason: e.to_string(),
                })?
                .map_err(|e| TransportError::Rejected {
                    url: server.url.clone(),
                    reason: e.to_string(),
                })?
        };
        debug!(url = %server.url, len = bytes.len(), "Relay stored object");
        self.store(bytes, now);
        Ok(())
    }

    async fn request_pubkey(
        &self,
        server: &ServerRecord,
        identifier: &PubkeyIdentifier,
        address_version: u64,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        self.enter(server)?;
        let state = self.state.lock();
        Ok(state
            .objects
            .iter()
            .rev()
            .find(|o| {
                RawObject::decode(&o.bytes).map_or(false, |raw| {
                    raw.header.object_type == ObjectType::Pubkey
                        && raw.header.version == address_version
                        && pubkey_matches(&raw, identifier)
                })
            })
            .map(|o| o.bytes.clone()))
    }

    async fn check_for_new_objects(
        &self,
        server: &ServerRecord,
        stream: u64,
        since: Timestamp,
        before: Timestamp,
    ) -> Result<Vec<Vec<u8>>, TransportError> {
        self.enter(server)?;
        let state = self.state.lock();
        Ok(state
            .objects
            .iter()
            .filter(|o| o.received >= since && o.received < before)
            .filter(|o| {
                RawObject::decode(&o.bytes).map_or(false, |raw| {
                    raw.header.object_type == ObjectType::Msg && raw.header.stream == stream
                })
            })
            .map(|o| o.bytes.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::InMemoryRepository;
    use crate::adapters::relay_pool::RelayPool;
    use crate::ports::outbound::Repository;
    use bm_02_pow::{PowConfig, PowParameters};
    use bm_03_objects::{attach_nonce, ObjectHeader};
    use shared_types::ManualTimeSource;

    const NOW: Timestamp = 1_700_000_000;

    fn setup(servers: usize) -> (Arc<MemoryRelay>, RelayPool) {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let relay = Arc::new(MemoryRelay::new(
            clock,
            PowEngine::new(PowConfig {
                nonce_trials_per_byte: 1,
                extra_bytes: 1,
                threads: 1,
                ..PowConfig::default()
            }),
        ));
        let repo = Arc::new(InMemoryRepository::new());
        for i in 0..servers {
            repo.add(ServerRecord::new(format!("relay{}", i), "", ""))
                .unwrap();
        }
        let pool = RelayPool::new(relay.clone(), repo);
        (relay, pool)
    }

    fn msg_object(marker: u8) -> Vec<u8> {
        attach_nonce(
            0,
            &ObjectHeader::new(ObjectType::Msg, 1, 1, NOW + 600).with_payload(&[marker; 40]),
        )
    }

    fn request(bytes: Vec<u8>, pow_done: bool) -> DisseminationRequest {
        DisseminationRequest {
            bytes,
            pow_done,
            params: PowParameters::new(1, 1),
            expiration: NOW + 600,
        }
    }

    #[tokio::test]
    async fn test_fails_over_to_working_server() {
        let (relay, pool) = setup(3);
        relay.set_offline("relay0", true);
        relay.set_offline("relay1", true);

        pool.disseminate(&request(msg_object(1), true)).await.unwrap();
        assert_eq!(relay.objects().len(), 1);
        assert_eq!(relay.calls("relay2"), 1);
    }

    #[tokio::test]
    async fn test_all_servers_down_is_exhaustion() {
        let (relay, pool) = setup(2);
        relay.set_offline("relay0", true);
        relay.set_offline("relay1", true);

        let err = pool.disseminate(&request(msg_object(1), true)).await.unwrap_err();
        assert_eq!(err, TransportError::Exhausted { attempted: 2 });
        assert_eq!(relay.calls("relay0") + relay.calls("relay1"), 2);
    }

    #[tokio::test]
    async fn test_no_servers() {
        let (_, pool) = setup(0);
        assert_eq!(
            pool.check_for_new_objects(1, 0, NOW).await.unwrap_err(),
            TransportError::NoServers
        );
    }

    #[tokio::test]
    async fn test_relay_completes_missing_pow() {
        let (relay, pool) = setup(1);
        pool.disseminate(&request(msg_object(2), false)).await.unwrap();

        let stored = relay.objects().remove(0);
        let engine = PowEngine::new(PowConfig::default());
        assert!(engine
            .verify(&stored, PowParameters::new(1, 1), NOW)
            .unwrap());
        assert_eq!(&stored[8..], &msg_object(2)[8..]);
    }

    #[tokio::test]
    async fn test_fetch_window_and_type_filter() {
        let (relay, pool) = setup(1);
        relay.inject(msg_object(1));
        relay.inject(attach_nonce(
            0,
            &ObjectHeader::new(ObjectType::GetPubkey, 4, 1, NOW + 600).with_payload(&[0; 32]),
        ));

        assert_eq!(pool.check_for_new_objects(1, NOW, NOW + 1).await.unwrap().len(), 1);
        assert!(pool.check_for_new_objects(1, NOW + 1, NOW + 2).await.unwrap().is_empty());
        assert!(pool.check_for_new_objects(2, NOW, NOW + 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_pubkey_is_none() {
        let (_, pool) = setup(2);
        let answer = pool
            .request_pubkey(&PubkeyIdentifier::Tag([7; 32]), 4)
            .await
            .unwrap();
        assert!(answer.is_none());
    }
}
