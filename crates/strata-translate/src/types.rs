use std::fmt;

use strata_types::{CollectionKind, MapKind};

/// Explicit descriptor of a field's declared type.
///
/// Container element types are carried as reified parameters. `None` is the
/// raw/erased case and resolves to [`TypeDesc::Any`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Unconstrained: translated by inspecting the runtime value.
    Any,
    Bool,
    Integer,
    Float,
    Text,
    Bytes,
    Key,
    Collection {
        kind: CollectionKind,
        element: Option<Box<TypeDesc>>,
    },
    Map {
        kind: MapKind,
        value: Option<Box<TypeDesc>>,
    },
    /// A registered class, stored as an embedded property map.
    Embedded(String),
}

impl TypeDesc {
    pub fn collection(kind: CollectionKind, element: TypeDesc) -> Self {
        Self::Collection {
            kind,
            element: Some(Box::new(element)),
        }
    }

    pub fn list_of(element: TypeDesc) -> Self {
        Self::collection(CollectionKind::List, element)
    }

    /// A collection whose element type is not known.
    pub fn raw_collection(kind: CollectionKind) -> Self {
        Self::Collection {
            kind,
            element: None,
        }
    }

    pub fn map_of(kind: MapKind, value: TypeDesc) -> Self {
        Self::Map {
            kind,
            value: Some(Box::new(value)),
        }
    }

    /// A map whose value type is not known.
    pub fn raw_map(kind: MapKind) -> Self {
        Self::Map { kind, value: None }
    }

    pub fn embedded(class: impl Into<String>) -> Self {
        Self::Embedded(class.into())
    }

    /// Element type of a collection, defaulting to `Any` when erased.
    pub fn element_type(&self) -> Option<TypeDesc> {
        match self {
            Self::Collection { element, .. } => {
                Some(element.as_deref().cloned().unwrap_or(TypeDesc::Any))
            }
            _ => None,
        }
    }

    /// Value type of a map, defaulting to `Any` when erased.
    pub fn map_value_type(&self) -> Option<TypeDesc> {
        match self {
            Self::Map { value, .. } => Some(value.as_deref().cloned().unwrap_or(TypeDesc::Any)),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Bool => write!(f, "bool"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Bytes => write!(f, "bytes"),
            Self::Key => write!(f, "key"),
            Self::Collection { kind, element } => match element {
                Some(element) => write!(f, "{kind:?}<{element}>"),
                None => write!(f, "{kind:?}"),
            },
            Self::Map { kind, value } => match value {
                Some(value) => write!(f, "{kind:?}Map<{value}>"),
                None => write!(f, "{kind:?}Map"),
            },
            Self::Embedded(class) => write!(f, "{class}"),
        }
    }
}

/// A single field annotation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Annotation {
    /// Store the map's values as a list; rebuild keys with the named mapper.
    Mapify(String),
    Index,
    Unindex,
}

/// Set of annotations on a field. Kept sorted so equal sets hash equally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Annotations(Vec<Annotation>);

impl Annotations {
    pub fn none() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, annotation: Annotation) -> Self {
        if let Err(pos) = self.0.binary_search(&annotation) {
            self.0.insert(pos, annotation);
        }
        self
    }

    pub fn contains(&self, annotation: &Annotation) -> bool {
        self.0.binary_search(annotation).is_ok()
    }

    /// Name of the key mapper, if the field is mapified.
    pub fn mapify(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match a {
            Annotation::Mapify(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Explicit index choice, if any. `Unindex` wins over `Index`.
    pub fn index_override(&self) -> Option<bool> {
        if self.contains(&Annotation::Unindex) {
            Some(false)
        } else if self.contains(&Annotation::Index) {
            Some(true)
        } else {
            None
        }
    }

    /// The same set minus any `Mapify`, used when resolving component types.
    pub fn without_mapify(&self) -> Self {
        Self(
            self.0
                .iter()
                .filter(|a| !matches!(a, Annotation::Mapify(_)))
                .cloned()
                .collect(),
        )
    }
}
