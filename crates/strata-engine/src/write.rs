use std::collections::HashMap;
use std::sync::Arc;

use strata_store::{AsyncDatastore, Deferred, Transaction};
use strata_types::{Instance, Key, Object, RawKey, Record};
use tracing::debug;

use crate::entity::EntityMetadata;
use crate::error::EngineResult;
use crate::factory::Factory;
use crate::session::{Session, SessionValue};

// ---------------------------------------------------------------------------
// Saveable / SavedEntities
// ---------------------------------------------------------------------------

/// Something the write engine can persist: an entity object, or a record
/// that is written as-is.
#[derive(Clone, Debug, PartialEq)]
pub enum Saveable {
    Object(Object),
    Record(Record),
}

impl Saveable {
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            Self::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            Self::Object(_) => None,
        }
    }
}

impl From<Object> for Saveable {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<Instance> for Saveable {
    fn from(instance: Instance) -> Self {
        Self::Object(Object::Instance(instance))
    }
}

impl From<Record> for Saveable {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

/// Outcome of a save: every input, keyed by its resolved key, in input order.
///
/// Saving the same key twice keeps the first position and the last value.
#[derive(Clone, Debug, Default)]
pub struct SavedEntities {
    entries: Vec<(Key, Saveable)>,
    positions: HashMap<Key, usize>,
}

impl SavedEntities {
    fn insert(&mut self, key: Key, value: Saveable) {
        match self.positions.get(&key) {
            Some(&at) => self.entries[at].1 = value,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Saveable> {
        self.positions.get(key).map(|&at| &self.entries[at].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Saveable)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn into_vec(self) -> Vec<(Key, Saveable)> {
        self.entries
    }
}

// ---------------------------------------------------------------------------
// WriteEngine
// ---------------------------------------------------------------------------

/// Batch persistence: translate, dispatch one backend call, post-process.
///
/// Translation runs synchronously inside [`WriteEngine::save`], so mapping
/// errors are returned before anything reaches the backend. Backend failures
/// surface when the returned [`Deferred`] is awaited. Nothing is retried.
pub struct WriteEngine {
    factory: Arc<Factory>,
    backend: Arc<dyn AsyncDatastore>,
    session: Arc<Session>,
    txn: Option<Transaction>,
}

impl WriteEngine {
    pub fn new(factory: Arc<Factory>, backend: Arc<dyn AsyncDatastore>, session: Arc<Session>) -> Self {
        Self {
            factory,
            backend,
            session,
            txn: None,
        }
    }

    /// Run every batch inside `txn`.
    pub fn with_transaction(mut self, txn: Transaction) -> Self {
        self.txn = Some(txn);
        self
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.txn.as_ref()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Persist a batch with a single backend `put`.
    ///
    /// Once the batch completes, entities whose numeric id is unset carry
    /// the id the backend assigned, the session entry for every written key
    /// is evicted, and the result maps each resolved key to its input.
    ///
    /// # Panics
    ///
    /// The returned future panics if the backend answers with a different
    /// number of keys than records it was given.
    pub fn save(&self, entities: Vec<Saveable>) -> EngineResult<Deferred<SavedEntities>> {
        let mut records = Vec::with_capacity(entities.len());
        let mut metadata: Vec<Option<Arc<EntityMetadata>>> = Vec::with_capacity(entities.len());
        for entity in &entities {
            match entity {
                Saveable::Record(record) => {
                    records.push(record.clone());
                    metadata.push(None);
                }
                Saveable::Object(object) => {
                    let meta = self.factory.metadata_for(object)?;
                    records.push(meta.save(object)?);
                    metadata.push(Some(meta));
                }
            }
        }

        debug!(count = records.len(), "saving");
        let session = Arc::clone(&self.session);
        let pending = self.backend.put(self.txn.as_ref(), records);
        Ok(pending.map(move |keys| complete_save(entities, metadata, keys, &session)))
    }

    /// Delete a batch with a single backend `delete`.
    ///
    /// Once the batch completes, the session holds a tombstone for every
    /// deleted key.
    pub fn delete(&self, keys: Vec<RawKey>) -> Deferred<()> {
        debug!(count = keys.len(), "deleting");
        let tombstones: Vec<Key> = keys.iter().cloned().map(Key::from_raw).collect();
        let session = Arc::clone(&self.session);
        self.backend
            .delete(self.txn.as_ref(), keys)
            .map(move |()| {
                let count = tombstones.len();
                for key in tombstones {
                    session.add(SessionValue::tombstone(key));
                }
                debug!(count, "deleted");
            })
    }
}

impl std::fmt::Debug for WriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteEngine")
            .field("factory", &self.factory)
            .field("txn", &self.txn)
            .finish_non_exhaustive()
    }
}

fn complete_save(
    entities: Vec<Saveable>,
    metadata: Vec<Option<Arc<EntityMetadata>>>,
    keys: Vec<RawKey>,
    session: &Session,
) -> SavedEntities {
    assert_eq!(
        keys.len(),
        entities.len(),
        "backend returned {} keys for a batch of {} records",
        keys.len(),
        entities.len()
    );

    let mut saved = SavedEntities::default();
    for ((mut entity, meta), raw) in entities.into_iter().zip(metadata).zip(keys) {
        if let (Saveable::Object(object), Some(meta)) = (&mut entity, &meta) {
            if meta.key().needs_id(object) {
                if let Some(id) = raw.long_id() {
                    meta.key().set_long_id(object, id);
                }
            }
        }
        let key = Key::from_raw(raw);
        session.remove(&key);
        saved.insert(key, entity);
    }
    debug!(count = saved.len(), "saved");
    saved
}
