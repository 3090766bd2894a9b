use std::collections::HashMap;
use std::sync::RwLock;

use strata_types::{Key, Object};

/// A session entry: what a key resolved to, or a tombstone if the entity is
/// known to be gone.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionValue {
    key: Key,
    value: Option<Object>,
}

impl SessionValue {
    pub fn loaded(key: Key, value: Object) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }

    /// An entry recording that `key` resolves to nothing.
    pub fn tombstone(key: Key) -> Self {
        Self { key, value: None }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn value(&self) -> Option<&Object> {
        self.value.as_ref()
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }
}

/// Request-scoped identity map.
///
/// The write path only adds and removes entries for keys it just wrote or
/// deleted. Concurrent writers of the same key must be serialized by the
/// caller.
#[derive(Debug, Default)]
pub struct Session {
    entries: RwLock<HashMap<Key, SessionValue>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `value.key()`.
    pub fn add(&self, value: SessionValue) {
        self.entries
            .write()
            .expect("lock poisoned")
            .insert(value.key.clone(), value);
    }

    pub fn remove(&self, key: &Key) -> Option<SessionValue> {
        self.entries.write().expect("lock poisoned").remove(key)
    }

    pub fn get(&self, key: &Key) -> Option<SessionValue> {
        self.entries.read().expect("lock poisoned").get(key).cloned()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.entries.read().expect("lock poisoned").contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().expect("lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::{Instance, RawKey};

    fn key(id: i64) -> Key {
        Key::from_raw(RawKey::with_id("Person", id))
    }

    #[test]
    fn add_get_remove() {
        let session = Session::new();
        let person = Object::from(Instance::new("Person").with("name", "ada"));
        session.add(SessionValue::loaded(key(1), person.clone()));
        assert!(session.contains(&key(1)));
        assert_eq!(session.get(&key(1)).unwrap().value(), Some(&person));

        let removed = session.remove(&key(1)).unwrap();
        assert!(!removed.is_tombstone());
        assert!(session.is_empty());
    }

    #[test]
    fn tombstone_replaces_loaded_value() {
        let session = Session::new();
        session.add(SessionValue::loaded(key(2), Object::Integer(1)));
        session.add(SessionValue::tombstone(key(2)));
        assert_eq!(session.len(), 1);
        assert!(session.get(&key(2)).unwrap().is_tombstone());
    }

    #[test]
    fn clear_empties() {
        let session = Session::new();
        session.add(SessionValue::tombstone(key(1)));
        session.add(SessionValue::tombstone(key(2)));
        session.clear();
        assert!(session.is_empty());
        assert!(session.get(&key(1)).is_none());
    }
}
