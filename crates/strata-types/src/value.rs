use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::RawKey;

/// A single record node.
///
/// The backend has no native nesting beyond repeated properties and embedded
/// property maps, and no concept of an empty list: a property whose list
/// would be empty is simply absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Key(RawKey),
    List(Vec<Value>),
    Embedded(PropertyMap),
}

impl Value {
    /// Short name of the node variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Key(_) => "key",
            Self::List(_) => "list",
            Self::Embedded(_) => "embedded",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for `Null` and for an empty list.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

/// A named property value plus its index flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub value: Value,
    pub indexed: bool,
}

/// Name-ordered bag of properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap(BTreeMap<String, Property>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property. An empty list removes the property instead, since an
    /// empty list and an absent property are the same thing to the backend.
    pub fn set(&mut self, name: impl Into<String>, value: Value, indexed: bool) {
        let name = name.into();
        if matches!(&value, Value::List(items) if items.is_empty()) {
            self.0.remove(&name);
            return;
        }
        self.0.insert(name, Property { value, indexed });
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).map(|p| &p.value)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_is_never_stored() {
        let mut props = PropertyMap::new();
        props.set("tags", Value::List(vec![]), true);
        assert!(!props.contains("tags"));
    }

    #[test]
    fn empty_list_removes_existing_property() {
        let mut props = PropertyMap::new();
        props.set("tags", Value::List(vec![Value::Text("a".into())]), true);
        assert!(props.contains("tags"));
        props.set("tags", Value::List(vec![]), true);
        assert!(props.is_empty());
    }

    #[test]
    fn null_scalar_is_stored() {
        let mut props = PropertyMap::new();
        props.set("nickname", Value::Null, false);
        assert_eq!(props.get("nickname"), Some(&Value::Null));
        assert!(!props.property("nickname").unwrap().indexed);
    }

    #[test]
    fn absent_covers_null_and_empty_list() {
        assert!(Value::Null.is_absent());
        assert!(Value::List(vec![]).is_absent());
        assert!(!Value::Integer(0).is_absent());
        assert!(!Value::Embedded(PropertyMap::new()).is_absent());
    }

    #[test]
    fn names_are_sorted() {
        let mut props = PropertyMap::new();
        props.set("b", Value::Bool(true), false);
        props.set("a", Value::Bool(false), false);
        assert_eq!(props.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
