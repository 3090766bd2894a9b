use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::RawKey;

/// An in-memory value with arbitrary structure.
///
/// This is the typed side of translation: entity and embedded class
/// instances, containers, and scalars. Containers carry their concrete kind
/// so that recycling an existing container keeps its ordering contract.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Key(RawKey),
    Collection(Collection),
    Map(ObjectMap),
    Instance(Instance),
}

impl Object {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Key(_) => "key",
            Self::Collection(_) => "collection",
            Self::Map(_) => "map",
            Self::Instance(_) => "instance",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_instance_mut(&mut self) -> Option<&mut Instance> {
        match self {
            Self::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection> {
        match self {
            Self::Collection(collection) => Some(collection),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ObjectMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut ObjectMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Total order across all objects: by variant first, then by content.
    /// Floats use IEEE total ordering.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Key(a), Self::Key(b)) => a.cmp(b),
            (Self::Collection(a), Self::Collection(b)) => cmp_seq(&a.items, &b.items),
            (Self::Map(a), Self::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.entries.iter().zip(&b.entries) {
                    let ord = ka.total_cmp(kb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.entries.len().cmp(&b.entries.len())
            }
            (Self::Instance(a), Self::Instance(b)) => a.class.cmp(&b.class).then_with(|| {
                for ((na, va), (nb, vb)) in a.fields.iter().zip(&b.fields) {
                    let ord = na.cmp(nb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.fields.len().cmp(&b.fields.len())
            }),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Integer(_) => 2,
            Self::Float(_) => 3,
            Self::Text(_) => 4,
            Self::Bytes(_) => 5,
            Self::Key(_) => 6,
            Self::Collection(_) => 7,
            Self::Map(_) => 8,
            Self::Instance(_) => 9,
        }
    }
}

fn cmp_seq(a: &[Object], b: &[Object]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = x.total_cmp(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Object {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Object {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Collection> for Object {
    fn from(v: Collection) -> Self {
        Self::Collection(v)
    }
}

impl From<ObjectMap> for Object {
    fn from(v: ObjectMap) -> Self {
        Self::Map(v)
    }
}

impl From<Instance> for Object {
    fn from(v: Instance) -> Self {
        Self::Instance(v)
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Sort direction of a sorted set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Concrete container type of a [`Collection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// Order-preserving, duplicates kept.
    List,
    /// Insertion-ordered, duplicates dropped.
    Set,
    /// Duplicates dropped, ordered by the set's own comparator.
    SortedSet(SortOrder),
}

impl CollectionKind {
    pub fn allows_duplicates(self) -> bool {
        matches!(self, Self::List)
    }
}

/// Homogeneous container whose add semantics follow its [`CollectionKind`].
///
/// Membership checks are logarithmic for sets and sorted sets; a `Set` keeps
/// a side index of item positions sorted by value.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection {
    kind: CollectionKind,
    items: Vec<Object>,
    /// Positions into `items`, ordered by value. Only kept for `Set`.
    index: Vec<usize>,
}

impl Collection {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            index: Vec::new(),
        }
    }

    pub fn with_capacity(kind: CollectionKind, capacity: usize) -> Self {
        Self {
            kind,
            items: Vec::with_capacity(capacity),
            index: Vec::new(),
        }
    }

    /// Build a collection by adding each item in turn.
    pub fn from_items(kind: CollectionKind, items: impl IntoIterator<Item = Object>) -> Self {
        let mut collection = Self::new(kind);
        for item in items {
            collection.add(item);
        }
        collection
    }

    pub fn list(items: impl IntoIterator<Item = Object>) -> Self {
        Self::from_items(CollectionKind::List, items)
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove all items. The kind (and with it the ordering) is kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Add an item. Returns `false` if the kind forbids the duplicate.
    pub fn add(&mut self, item: Object) -> bool {
        match self.kind {
            CollectionKind::List => {
                self.items.push(item);
                true
            }
            CollectionKind::Set => match self.set_slot(&item) {
                Ok(_) => false,
                Err(slot) => {
                    self.index.insert(slot, self.items.len());
                    self.items.push(item);
                    true
                }
            },
            CollectionKind::SortedSet(order) => match self.sorted_slot(order, &item) {
                Ok(_) => false,
                Err(pos) => {
                    self.items.insert(pos, item);
                    true
                }
            },
        }
    }

    pub fn contains(&self, item: &Object) -> bool {
        match self.kind {
            CollectionKind::List => self
                .items
                .iter()
                .any(|probe| probe.total_cmp(item) == Ordering::Equal),
            CollectionKind::Set => self.set_slot(item).is_ok(),
            CollectionKind::SortedSet(order) => self.sorted_slot(order, item).is_ok(),
        }
    }

    fn set_slot(&self, item: &Object) -> Result<usize, usize> {
        self.index
            .binary_search_by(|&at| self.items[at].total_cmp(item))
    }

    fn sorted_slot(&self, order: SortOrder, item: &Object) -> Result<usize, usize> {
        self.items.binary_search_by(|probe| match order {
            SortOrder::Ascending => probe.total_cmp(item),
            SortOrder::Descending => item.total_cmp(probe),
        })
    }

    pub fn items(&self) -> &[Object] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ---------------------------------------------------------------------------
// ObjectMap
// ---------------------------------------------------------------------------

/// Concrete container type of an [`ObjectMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapKind {
    /// Insertion-ordered.
    Linked,
    /// Ordered by key.
    Sorted,
}

/// Associative container; inserting an existing key overwrites its value.
///
/// Lookups are logarithmic: a `Sorted` map searches its entries directly and
/// a `Linked` map keeps a side index of entry positions sorted by key.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectMap {
    kind: MapKind,
    entries: Vec<(Object, Object)>,
    /// Positions into `entries`, ordered by key. Only kept for `Linked`.
    index: Vec<usize>,
}

impl ObjectMap {
    pub fn new(kind: MapKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: Vec::new(),
        }
    }

    pub fn kind(&self) -> MapKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Position of `key` in `entries`.
    fn find(&self, key: &Object) -> Option<usize> {
        match self.kind {
            MapKind::Linked => self.linked_slot(key).ok().map(|slot| self.index[slot]),
            MapKind::Sorted => self.sorted_slot(key).ok(),
        }
    }

    fn linked_slot(&self, key: &Object) -> Result<usize, usize> {
        self.index
            .binary_search_by(|&at| self.entries[at].0.total_cmp(key))
    }

    fn sorted_slot(&self, key: &Object) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.total_cmp(key))
    }

    /// Insert a value, returning the value previously held under `key`.
    pub fn insert(&mut self, key: Object, value: Object) -> Option<Object> {
        let slot = match self.kind {
            MapKind::Linked => self.linked_slot(&key).map(|slot| self.index[slot]),
            MapKind::Sorted => self.sorted_slot(&key),
        };
        match slot {
            Ok(pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            Err(slot) if self.kind == MapKind::Linked => {
                self.index.insert(slot, self.entries.len());
                self.entries.push((key, value));
                None
            }
            Err(pos) => {
                self.entries.insert(pos, (key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Object) -> Option<&Object> {
        self.find(key).map(|pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &Object) -> bool {
        self.find(key).is_some()
    }

    pub fn remove(&mut self, key: &Object) -> Option<Object> {
        match self.kind {
            MapKind::Linked => {
                let slot = self.linked_slot(key).ok()?;
                let pos = self.index.remove(slot);
                for at in &mut self.index {
                    if *at > pos {
                        *at -= 1;
                    }
                }
                Some(self.entries.remove(pos).1)
            }
            MapKind::Sorted => {
                let pos = self.sorted_slot(key).ok()?;
                Some(self.entries.remove(pos).1)
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Object> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Object> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Object, &Object)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// An instance of a registered class: class name plus named fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    class: String,
    fields: BTreeMap<String, Object>,
}

impl Instance {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Object>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn get(&self, name: &str) -> Option<&Object> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Object> {
        self.fields.get_mut(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Object>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Object> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(s: &str) -> Object {
        Object::from(s)
    }

    // -----------------------------------------------------------------------
    // Collection kinds
    // -----------------------------------------------------------------------

    #[test]
    fn list_keeps_duplicates_and_order() {
        let list = Collection::list(vec![text("b"), text("a"), text("b")]);
        assert_eq!(list.items(), &[text("b"), text("a"), text("b")]);
    }

    #[test]
    fn set_drops_duplicates_keeps_insertion_order() {
        let set = Collection::from_items(
            CollectionKind::Set,
            vec![text("b"), text("a"), text("b")],
        );
        assert_eq!(set.items(), &[text("b"), text("a")]);
    }

    #[test]
    fn sorted_set_orders_by_comparator() {
        let asc = Collection::from_items(
            CollectionKind::SortedSet(SortOrder::Ascending),
            vec![Object::Integer(3), Object::Integer(1), Object::Integer(2)],
        );
        assert_eq!(
            asc.items(),
            &[Object::Integer(1), Object::Integer(2), Object::Integer(3)]
        );

        let mut desc = Collection::new(CollectionKind::SortedSet(SortOrder::Descending));
        for i in [1, 3, 2, 3] {
            desc.add(Object::Integer(i));
        }
        assert_eq!(
            desc.items(),
            &[Object::Integer(3), Object::Integer(2), Object::Integer(1)]
        );
    }

    #[test]
    fn cleared_set_accepts_former_items() {
        let mut set = Collection::from_items(CollectionKind::Set, vec![text("a"), text("b")]);
        set.clear();
        assert!(!set.contains(&text("a")));
        assert!(set.add(text("b")));
        assert!(set.add(text("a")));
        assert_eq!(set.items(), &[text("b"), text("a")]);
    }

    #[test]
    fn clear_keeps_kind() {
        let mut set = Collection::new(CollectionKind::SortedSet(SortOrder::Descending));
        set.add(Object::Integer(1));
        set.clear();
        assert!(set.is_empty());
        assert_eq!(set.kind(), CollectionKind::SortedSet(SortOrder::Descending));
    }

    // -----------------------------------------------------------------------
    // Maps
    // -----------------------------------------------------------------------

    #[test]
    fn linked_map_overwrites_in_place() {
        let mut map = ObjectMap::new(MapKind::Linked);
        map.insert(text("x"), Object::Integer(1));
        map.insert(text("y"), Object::Integer(2));
        assert_eq!(map.insert(text("x"), Object::Integer(3)), Some(Object::Integer(1)));
        assert_eq!(map.keys().cloned().collect::<Vec<_>>(), vec![text("x"), text("y")]);
        assert_eq!(map.get(&text("x")), Some(&Object::Integer(3)));
    }

    #[test]
    fn linked_map_remove_keeps_lookups_consistent() {
        let mut map = ObjectMap::new(MapKind::Linked);
        for (i, name) in ["d", "a", "c", "b"].iter().enumerate() {
            map.insert(text(name), Object::Integer(i as i64));
        }
        assert_eq!(map.remove(&text("a")), Some(Object::Integer(1)));
        assert_eq!(map.remove(&text("a")), None);
        assert_eq!(
            map.keys().cloned().collect::<Vec<_>>(),
            vec![text("d"), text("c"), text("b")]
        );
        assert_eq!(map.get(&text("b")), Some(&Object::Integer(3)));
        assert_eq!(map.get(&text("d")), Some(&Object::Integer(0)));
        map.insert(text("a"), Object::Integer(9));
        assert_eq!(map.keys().last(), Some(&text("a")));
    }

    #[test]
    fn sorted_map_orders_keys() {
        let mut map = ObjectMap::new(MapKind::Sorted);
        map.insert(text("c"), Object::Null);
        map.insert(text("a"), Object::Null);
        map.insert(text("b"), Object::Null);
        assert_eq!(
            map.keys().cloned().collect::<Vec<_>>(),
            vec![text("a"), text("b"), text("c")]
        );
        assert!(map.remove(&text("b")).is_some());
        assert!(!map.contains_key(&text("b")));
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[test]
    fn total_cmp_ranks_variants() {
        assert_eq!(Object::Null.total_cmp(&Object::Bool(false)), Ordering::Less);
        assert_eq!(
            Object::Float(f64::NAN).total_cmp(&Object::Float(f64::NAN)),
            Ordering::Equal
        );
        assert_eq!(text("a").total_cmp(&Object::Integer(9)), Ordering::Greater);
    }

    proptest! {
        #[test]
        fn set_matches_first_occurrence_order(values in proptest::collection::vec(0i64..20, 0..64)) {
            let set = Collection::from_items(
                CollectionKind::Set,
                values.iter().map(|v| Object::Integer(*v)),
            );
            let mut expected: Vec<Object> = Vec::new();
            for v in &values {
                if !expected.contains(&Object::Integer(*v)) {
                    expected.push(Object::Integer(*v));
                }
            }
            prop_assert_eq!(set.items(), expected.as_slice());
            for v in &values {
                prop_assert!(set.contains(&Object::Integer(*v)));
            }
        }

        #[test]
        fn sorted_set_is_strictly_ordered(values in proptest::collection::vec(any::<i64>(), 0..64)) {
            let set = Collection::from_items(
                CollectionKind::SortedSet(SortOrder::Descending),
                values.iter().map(|v| Object::Integer(*v)),
            );
            for pair in set.items().windows(2) {
                prop_assert_eq!(pair[0].total_cmp(&pair[1]), Ordering::Greater);
            }
        }

        #[test]
        fn linked_map_last_write_wins_in_first_position(
            writes in proptest::collection::vec((0i64..10, any::<i64>()), 0..64),
        ) {
            let mut map = ObjectMap::new(MapKind::Linked);
            let mut expected: Vec<(i64, i64)> = Vec::new();
            for (k, v) in &writes {
                map.insert(Object::Integer(*k), Object::Integer(*v));
                match expected.iter_mut().find(|(ek, _)| ek == k) {
                    Some(entry) => entry.1 = *v,
                    None => expected.push((*k, *v)),
                }
            }
            let actual: Vec<(Object, Object)> =
                map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            let expected: Vec<(Object, Object)> = expected
                .into_iter()
                .map(|(k, v)| (Object::Integer(k), Object::Integer(v)))
                .collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn instance_builder_and_lookup() {
        let mut person = Instance::new("Person").with("name", "ada").with("age", 36i64);
        assert_eq!(person.class(), "Person");
        assert_eq!(person.get("name"), Some(&text("ada")));
        person.set("age", 37i64);
        assert_eq!(person.get("age"), Some(&Object::Integer(37)));
        assert_eq!(person.fields().count(), 2);
    }
}
