use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The identifying component of a [`RawKey`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum KeyId {
    /// No identifier yet. The backend allocates a numeric id on put.
    Incomplete,
    /// Numeric identifier, either backend-allocated or caller-assigned.
    Id(i64),
    /// Caller-assigned string identifier.
    Name(String),
}

/// Backend identifier for a stored record.
///
/// A raw key names an entity kind, an optional parent key, and the id
/// component. Before a create the id may be [`KeyId::Incomplete`]; the
/// backend returns a complete key from every put.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RawKey {
    parent: Option<Box<RawKey>>,
    kind: String,
    id: KeyId,
}

impl RawKey {
    /// An incomplete key whose id will be allocated by the backend.
    pub fn incomplete(kind: impl Into<String>) -> Self {
        Self {
            parent: None,
            kind: kind.into(),
            id: KeyId::Incomplete,
        }
    }

    /// A complete key with a numeric id.
    pub fn with_id(kind: impl Into<String>, id: i64) -> Self {
        Self {
            parent: None,
            kind: kind.into(),
            id: KeyId::Id(id),
        }
    }

    /// A complete key with a string name.
    pub fn with_name(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            parent: None,
            kind: kind.into(),
            id: KeyId::Name(name.into()),
        }
    }

    /// Attach a parent key.
    pub fn with_parent(mut self, parent: RawKey) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn parent(&self) -> Option<&RawKey> {
        self.parent.as_deref()
    }

    /// The numeric id, if this key has one.
    pub fn long_id(&self) -> Option<i64> {
        match self.id {
            KeyId::Id(id) => Some(id),
            _ => None,
        }
    }

    /// The string name, if this key has one.
    pub fn name(&self) -> Option<&str> {
        match &self.id {
            KeyId::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Returns `true` if this key (and every ancestor) carries an id or name.
    pub fn is_complete(&self) -> bool {
        !matches!(self.id, KeyId::Incomplete)
            && self.parent.as_deref().map_or(true, RawKey::is_complete)
    }

    /// A copy of this key with the numeric id filled in.
    pub fn complete_with(&self, id: i64) -> Self {
        Self {
            parent: self.parent.clone(),
            kind: self.kind.clone(),
            id: KeyId::Id(id),
        }
    }

    /// Web-safe string form: hex over the JSON encoding of the key path.
    pub fn to_websafe(&self) -> Result<String, TypeError> {
        let json =
            serde_json::to_vec(self).map_err(|e| TypeError::Serialization(e.to_string()))?;
        Ok(hex::encode(json))
    }

    /// Parse the form produced by [`Self::to_websafe`].
    pub fn from_websafe(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TypeError::InvalidKey(e.to_string()))
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.parent {
            write!(f, "{parent}/")?;
        }
        match &self.id {
            KeyId::Incomplete => write!(f, "{}(?)", self.kind),
            KeyId::Id(id) => write!(f, "{}({id})", self.kind),
            KeyId::Name(name) => write!(f, "{}({name:?})", self.kind),
        }
    }
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawKey({self})")
    }
}

/// Logical key for a persisted object.
///
/// Wraps a [`RawKey`]; equality and hashing follow the resolved identity
/// components, so an unresolved key never equals the key the backend later
/// assigns.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key(RawKey);

impl Key {
    pub fn from_raw(raw: RawKey) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> &RawKey {
        &self.0
    }

    pub fn into_raw(self) -> RawKey {
        self.0
    }

    pub fn kind(&self) -> &str {
        self.0.kind()
    }

    /// Returns `true` once the backend (or the caller) has assigned an id.
    pub fn is_resolved(&self) -> bool {
        self.0.is_complete()
    }
}

impl From<RawKey> for Key {
    fn from(raw: RawKey) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}
