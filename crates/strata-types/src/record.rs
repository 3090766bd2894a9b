use serde::{Deserialize, Serialize};

use crate::key::RawKey;
use crate::value::{Property, PropertyMap, Value};

/// The flat, backend-native representation of one persisted object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    key: RawKey,
    properties: PropertyMap,
}

impl Record {
    /// An empty record for the given key.
    pub fn new(key: RawKey) -> Self {
        Self {
            key,
            properties: PropertyMap::new(),
        }
    }

    pub fn with_properties(key: RawKey, properties: PropertyMap) -> Self {
        Self { key, properties }
    }

    pub fn key(&self) -> &RawKey {
        &self.key
    }

    pub fn set_key(&mut self, key: RawKey) {
        self.key = key;
    }

    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    /// See [`PropertyMap::set`]: empty lists are dropped.
    pub fn set_property(&mut self, name: impl Into<String>, value: Value, indexed: bool) {
        self.properties.set(name, value, indexed);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.property(name)
    }

    pub fn into_parts(self) -> (RawKey, PropertyMap) {
        (self.key, self.properties)
    }
}
