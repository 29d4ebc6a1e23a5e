//! Process-wide saga state, keyed by transaction id.

use std::collections::HashMap;
use std::sync::RwLock;

use stashport_core::TransactionId;

use crate::saga::SagaRecord;

/// Thread-safe map of in-flight sagas.
///
/// State is volatile: entries exist only between the accept-phase emission
/// and the terminal event, and everything is lost on restart. Reads are
/// concurrent; `store`/`delete` take the write lock.
#[derive(Debug, Default)]
pub struct SagaCache {
    entries: RwLock<HashMap<TransactionId, SagaRecord>>,
}

impl SagaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or silently overwrite the record for a transaction.
    pub fn store(&self, transaction_id: TransactionId, record: SagaRecord) {
        self.write().insert(transaction_id, record);
    }

    pub fn get(&self, transaction_id: TransactionId) -> Option<SagaRecord> {
        self.read().get(&transaction_id).cloned()
    }

    /// Remove the record for a transaction; missing ids are a no-op.
    pub fn delete(&self, transaction_id: TransactionId) {
        self.write().remove(&transaction_id);
    }

    // A poisoned lock only means a handler panicked mid-access; the map
    // itself is still usable.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<TransactionId, SagaRecord>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<TransactionId, SagaRecord>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
