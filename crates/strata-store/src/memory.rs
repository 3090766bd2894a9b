use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use strata_types::{KeyId, RawKey, Record};
use tracing::debug;

use crate::deferred::Deferred;
use crate::error::{StoreError, StoreResult};
use crate::traits::{AsyncDatastore, Transaction};

#[derive(Default)]
struct State {
    /// bincode-encoded records by key.
    records: BTreeMap<RawKey, Vec<u8>>,
    /// Next id to hand out per kind.
    next_ids: HashMap<String, i64>,
}

/// Complete `key` against `next_ids`, the per-kind id counters.
fn allocate(next_ids: &mut HashMap<String, i64>, key: &RawKey) -> StoreResult<RawKey> {
    if key.parent().is_some_and(|p| !p.is_complete()) {
        return Err(StoreError::IncompleteParent(key.to_string()));
    }
    let next = next_ids.entry(key.kind().to_string()).or_insert(1);
    match key.id() {
        KeyId::Incomplete => {
            let id = *next;
            *next += 1;
            Ok(key.complete_with(id))
        }
        KeyId::Id(id) => {
            // Never hand out an id the caller already used.
            if *id >= *next {
                *next = id + 1;
            }
            Ok(key.clone())
        }
        KeyId::Name(_) => Ok(key.clone()),
    }
}

/// In-memory, map-based record store.
///
/// Intended for tests and embedding. Records are stored bincode-encoded so
/// callers never share memory with stored data, and every batch runs on a
/// spawned tokio task. Requires a tokio runtime.
#[derive(Clone, Default)]
pub struct InMemoryDatastore {
    state: Arc<RwLock<State>>,
    pending_failure: Arc<RwLock<Option<StoreError>>>,
    batches: Arc<AtomicUsize>,
}

impl InMemoryDatastore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").records.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &RawKey) -> bool {
        self.state
            .read()
            .expect("lock poisoned")
            .records
            .contains_key(key)
    }

    /// Read one record synchronously.
    pub fn record(&self, key: &RawKey) -> StoreResult<Option<Record>> {
        let state = self.state.read().expect("lock poisoned");
        state.records.get(key).map(|bytes| decode(bytes)).transpose()
    }

    /// Number of batch operations dispatched so far.
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Make the next dispatched batch fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        *self.pending_failure.write().expect("lock poisoned") = Some(error);
    }

    fn dispatch(&self) -> Option<StoreError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.pending_failure.write().expect("lock poisoned").take()
    }
}

impl AsyncDatastore for InMemoryDatastore {
    fn put(&self, txn: Option<&Transaction>, records: Vec<Record>) -> Deferred<Vec<RawKey>> {
        if let Some(error) = self.dispatch() {
            return Deferred::ready(Err(error));
        }
        let state = Arc::clone(&self.state);
        let txn = txn.map(Transaction::id);
        Deferred::spawn(async move {
            // Stage keys, ids, and encodings; commit only if every record succeeds.
            let mut state = state.write().expect("lock poisoned");
            let mut next_ids = state.next_ids.clone();
            let mut staged = Vec::with_capacity(records.len());
            for mut record in records {
                let key = allocate(&mut next_ids, record.key())?;
                record.set_key(key.clone());
                staged.push((key, encode(&record)?));
            }
            let keys: Vec<RawKey> = staged.iter().map(|(k, _)| k.clone()).collect();
            state.next_ids = next_ids;
            state.records.extend(staged);
            debug!(count = keys.len(), ?txn, "put batch");
            Ok(keys)
        })
    }

    fn delete(&self, txn: Option<&Transaction>, keys: Vec<RawKey>) -> Deferred<()> {
        if let Some(error) = self.dispatch() {
            return Deferred::ready(Err(error));
        }
        let state = Arc::clone(&self.state);
        let txn = txn.map(Transaction::id);
        Deferred::spawn(async move {
            let mut state = state.write().expect("lock poisoned");
            for key in &keys {
                state.records.remove(key);
            }
            debug!(count = keys.len(), ?txn, "delete batch");
            Ok(())
        })
    }

    fn get(&self, _txn: Option<&Transaction>, keys: Vec<RawKey>) -> Deferred<Vec<Option<Record>>> {
        if let Some(error) = self.dispatch() {
            return Deferred::ready(Err(error));
        }
        let state = Arc::clone(&self.state);
        Deferred::spawn(async move {
            let state = state.read().expect("lock poisoned");
            let found = keys
                .iter()
                .map(|key| state.records.get(key).map(|bytes| decode(bytes)).transpose())
                .collect::<StoreResult<Vec<_>>>()?;
            debug!(count = keys.len(), hits = found.iter().flatten().count(), "get batch");
            Ok(found)
        })
    }
}

impl std::fmt::Debug for InMemoryDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDatastore")
            .field("record_count", &self.len())
            .field("batch_count", &self.batch_count())
            .finish()
    }
}

fn encode(record: &Record) -> StoreResult<Vec<u8>> {
    bincode::serialize(record).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> StoreResult<Record> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}
