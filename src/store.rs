//! Ground-truth record store
//!
//! `AuthorityStore` is the only component allowed to change what is true.
//! Everything else reads it through `snapshot()`, which hands out an
//! independent copy so no reader can reach the live mapping.

use crate::error::{CrossViewError, Result};
use crate::types::{Record, RecordId};
use indexmap::IndexMap;
use std::sync::{PoisonError, RwLock};

/// Authoritative, insertion-ordered set of records
///
/// Thread-safe: `add`/`remove` take the write lock, `snapshot` copies under
/// the read lock, and no lock is held past the call that took it.
#[derive(Debug, Default)]
pub struct AuthorityStore {
    /// id → record, in insertion order
    records: RwLock<IndexMap<RecordId, Record>>,
}

impl AuthorityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with records, failing on the first duplicate id
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let store = Self::new();
        for record in records {
            store.add(record)?;
        }
        Ok(store)
    }

    /// Insert a record at the end of iteration order
    pub fn add(&self, record: Record) -> Result<()> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.contains_key(&record.id) {
            return Err(CrossViewError::DuplicateId { id: record.id });
        }

        tracing::debug!(id = %record.id, label = %record.label, "Record added to authority");
        records.insert(record.id.clone(), record);
        Ok(())
    }

    /// Delete a record, returning it
    pub fn remove(&self, id: &RecordId) -> Result<Record> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        // shift_remove keeps the remaining records in insertion order
        let removed = records
            .shift_remove(id)
            .ok_or_else(|| CrossViewError::NotFound { id: id.clone() })?;

        tracing::debug!(id = %id, "Record removed from authority");
        Ok(removed)
    }

    /// Point-in-time ordered copy of every record
    pub fn snapshot(&self) -> Vec<Record> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.values().cloned().collect()
    }

    /// Copy of a single record
    pub fn get(&self, id: &RecordId) -> Option<Record> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(id).cloned()
    }

    /// Whether a record with this id exists
    pub fn contains(&self, id: &RecordId) -> bool {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.contains_key(id)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
