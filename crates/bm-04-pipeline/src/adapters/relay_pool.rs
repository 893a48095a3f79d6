//! # Relay Fail-over
//!
//! Every call takes a snapshot of the known servers and walks a fresh
//! [`ServerRotation`] over it, starting at a random offset. The first
//! server that answers wins; when every server has failed the call
//! returns `TransportError::Exhausted`, which callers treat as retryable.

use crate::error::TransportError;
use crate::ports::outbound::{DisseminationRequest, RelayClient, Repository};
use bm_03_objects::PubkeyIdentifier;
use rand::Rng;
use shared_types::{ServerRecord, Timestamp};
use std::sync::Arc;
use tracing::{debug, warn};

/// Round-robin pass over an immutable server list, visiting each once.
#[derive(Debug, Clone)]
pub struct ServerRotation {
    servers: Arc<[ServerRecord]>,
    start: usize,
    visited: usize,
}

impl ServerRotation {
    /// Start at `start` (modulo the list length).
    pub fn new(servers: Arc<[ServerRecord]>, start: usize) -> Self {
        let start = if servers.is_empty() {
            0
        } else {
            start % servers.len()
        };
        Self {
            servers,
            start,
            visited: 0,
        }
    }

    /// Start at a random server.
    pub fn shuffled(servers: Arc<[ServerRecord]>) -> Self {
        let start = if servers.is_empty() {
            0
        } else {
            rand::thread_rng().gen_range(0..servers.len())
        };
        Self::new(servers, start)
    }

    /// Number of servers in the rotation.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// True when there is nothing to rotate over.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl Iterator for ServerRotation {
    type Item = ServerRecord;

    fn next(&mut self) -> Option<ServerRecord> {
        if self.visited >= self.servers.len() {
            return None;
        }
        let index = (self.start + self.visited) % self.servers.len();
        self.visited += 1;
        Some(self.servers[index].clone())
    }
}

/// Relay client with fail-over across every stored server.
#[derive(Clone)]
pub struct RelayPool {
    client: Arc<dyn RelayClient>,
    servers: Arc<dyn Repository<ServerRecord>>,
}

impl RelayPool {
    /// Pool over the servers in `servers`.
    pub fn new(client: Arc<dyn RelayClient>, servers: Arc<dyn Repository<ServerRecord>>) -> Self {
        Self { client, servers }
    }

    fn rotation(&self) -> Result<ServerRotation, TransportError> {
        let servers = self
            .servers
            .all()
            .map_err(|e| TransportError::Unreachable {
                url: "server list".into(),
                reason: e.to_string(),
            })?;
        if servers.is_empty() {
            return Err(TransportError::NoServers);
        }
        Ok(ServerRotation::shuffled(servers.into()))
    }

    /// Publish on the first server that accepts.
    pub async fn disseminate(&self, request: &DisseminationRequest) -> Result<(), TransportError> {
        let rotation = self.rotation()?;
        let attempted = rotation.len();
        for server in rotation {
            match self.client.disseminate(&server, request).await {
                Ok(()) => {
                    debug!(url = %server.url, len = request.bytes.len(), "Object disseminated");
                    return Ok(());
                }
                Err(e) => warn!(url = %server.url, error = %e, "Dissemination failed, trying next server"),
            }
        }
        Err(TransportError::Exhausted { attempted })
    }

    /// Ask servers in turn until one returns a pubkey object.
    ///
    /// `Ok(None)` means every server answered and none had it.
    pub async fn request_pubkey(
        &self,
        identifier: &PubkeyIdentifier,
        address_version: u64,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let rotation = self.rotation()?;
        let attempted = rotation.len();
        let mut answered = false;
        for server in rotation {
            match self
                .client
                .request_pubkey(&server, identifier, address_version)
                .await
            {
                Ok(Some(bytes)) => return Ok(Some(bytes)),
                Ok(None) => answered = true,
                Err(e) => warn!(url = %server.url, error = %e, "Pubkey request failed, trying next server"),
            }
        }
        if answered {
            Ok(None)
        } else {
            Err(TransportError::Exhausted { attempted })
        }
    }

    /// Fetch objects from the first server that answers.
    pub async fn check_for_new_objects(
        &self,
        stream: u64,
        since: Timestamp,
        before: Timestamp,
    ) -> Result<Vec<Vec<u8>>, TransportError> {
        let rotation = self.rotation()?;
        let attempted = rotation.len();
        for server in rotation {
            match self
                .client
                .check_for_new_objects(&server, stream, since, before)
                .await
            {
                Ok(objects) => {
                    debug!(url = %server.url, count = objects.len(), "Fetched objects");
                    return Ok(objects);
                }
                Err(e) => warn!(url = %server.url, error = %e, "Object fetch failed, trying next server"),
            }
        }
        Err(TransportError::Exhausted { attempted })
    }
}
