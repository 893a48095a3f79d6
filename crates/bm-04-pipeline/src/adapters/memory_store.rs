//! In-memory record store
//!
//! One `BTreeMap` per record type behind a `RwLock`, ids from an atomic
//! counter starting at 1.

use crate::ports::outbound::{Repository, Store};
use parking_lot::RwLock;
use shared_types::{Record, RecordId, StoreError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// `Repository` backed by a map.
#[derive(Debug)]
pub struct InMemoryRepository<R: Record> {
    rows: RwLock<BTreeMap<RecordId, R>>,
    next_id: AtomicU64,
}

impl<R: Record> InMemoryRepository<R> {
    /// Empty table.
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }

    fn existing_id(record: &R) -> Result<RecordId, StoreError> {
        record.id().ok_or(StoreError::MissingId(R::KIND))
    }
}

impl<R: Record> Default for InMemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> Repository<R> for InMemoryRepository<R> {
    fn add(&self, mut record: R) -> Result<RecordId, StoreError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        record.set_id(id);
        self.rows.write().insert(id, record);
        Ok(id)
    }

    fn update(&self, record: &R) -> Result<(), StoreError> {
        let id = Self::existing_id(record)?;
        let mut rows = self.rows.write();
        match rows.get_mut(&id) {
            Some(row) => {
                *row = record.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound { kind: R::KIND, id }),
        }
    }

    fn delete(&self, record: &R) -> Result<(), StoreError> {
        let id = Self::existing_id(record)?;
        self.rows
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { kind: R::KIND, id })
    }

    fn search(&self, field: &R::Field) -> Result<Vec<R>, StoreError> {
        Ok(self
            .rows
            .read()
            .values()
            .filter(|r| r.matches(field))
            .cloned()
            .collect())
    }

    fn search_single(&self, id: RecordId) -> Result<R, StoreError> {
        self.rows
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { kind: R::KIND, id })
    }

    fn all(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.rows.read().values().cloned().collect())
    }
}

impl Store {
    /// Store with an empty in-memory table per record type.
    pub fn in_memory() -> Self {
        Self {
            addresses: Arc::new(InMemoryRepository::new()),
            pubkeys: Arc::new(InMemoryRepository::new()),
            messages: Arc::new(InMemoryRepository::new()),
            payloads: Arc::new(InMemoryRepository::new()),
            queue: Arc::new(InMemoryRepository::new()),
            servers: Arc::new(InMemoryRepository::new()),
        }
    }
}
