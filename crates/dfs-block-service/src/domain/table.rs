//! Per-node block table: the only shared mutable resource in the service.
//!
//! Readers never take the per-block gate. Each entry stores its record as an
//! `Arc<BlockRecord>` that is swapped wholesale on commit, so a reader's
//! snapshot is always one fully-consistent record — never a torn mix of an
//! old length and a new generation stamp.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{BlockKey, BlockRecord, BlockState};

/// One live block entry.
///
/// `gate` serializes writers: a recovery round holds it exclusively, a
/// streaming copy read holds it shared. Metadata reads bypass it entirely.
pub struct BlockEntry {
    record: RwLock<Arc<BlockRecord>>,
    state: RwLock<BlockState>,
    /// Async writer/reader gate, held across network awaits.
    pub(crate) gate: tokio::sync::RwLock<()>,
}

impl BlockEntry {
    fn new(record: BlockRecord) -> Self {
        Self {
            record: RwLock::new(Arc::new(record)),
            state: RwLock::new(BlockState::Registered),
            gate: tokio::sync::RwLock::new(()),
        }
    }

    /// Consistent snapshot of the current record.
    pub fn snapshot(&self) -> Arc<BlockRecord> {
        self.record.read().clone()
    }

    /// Atomically replace the record (recovery commit).
    pub fn replace(&self, record: BlockRecord) {
        *self.record.write() = Arc::new(record);
    }

    pub fn state(&self) -> BlockState {
        *self.state.read()
    }

    pub fn set_state(&self, state: BlockState) {
        *self.state.write() = state;
    }
}

/// Authoritative block table for one datanode.
pub struct BlockTable {
    entries: RwLock<HashMap<BlockKey, Arc<BlockEntry>>>,
}

impl BlockTable {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a record.
    ///
    /// Replacing reuses the existing entry so in-flight gate holders keep
    /// their serialization against later writers.
    pub fn insert(&self, record: BlockRecord) {
        let key = record.key();
        let mut entries = self.entries.write();
        match entries.get(&key) {
            Some(entry) => entry.replace(record),
            None => {
                entries.insert(key, Arc::new(BlockEntry::new(record)));
            }
        }
    }

    /// Look up the live entry for a key.
    pub fn entry(&self, key: &BlockKey) -> Option<Arc<BlockEntry>> {
        self.entries.read().get(key).cloned()
    }

    /// Consistent snapshot of the record for a key.
    pub fn snapshot(&self, key: &BlockKey) -> Option<Arc<BlockRecord>> {
        self.entries.read().get(key).map(|e| e.snapshot())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for BlockTable {
    fn default() -> Self {
        Self::new()
    }
}
