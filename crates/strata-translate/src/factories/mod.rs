//! Built-in translator factories, in default chain order.

pub mod any;
pub mod collection;
pub mod embedded;
pub mod map;
pub mod mapify;
pub mod scalar;

use std::sync::Arc;

use strata_types::Value;

use crate::registry::TranslatorFactory;

pub use any::AnyTranslatorFactory;
pub use collection::CollectionTranslatorFactory;
pub use embedded::{ClassTranslator, EmbeddedTranslatorFactory};
pub use map::MapTranslatorFactory;
pub use mapify::MapifyTranslatorFactory;
pub use scalar::ScalarTranslatorFactory;

/// The standard chain: Mapify -> Collection -> Map -> Embedded -> Scalar -> Any
pub fn default_factories() -> Vec<Arc<dyn TranslatorFactory>> {
    vec![
        Arc::new(MapifyTranslatorFactory),
        Arc::new(CollectionTranslatorFactory),
        Arc::new(MapTranslatorFactory),
        Arc::new(EmbeddedTranslatorFactory),
        Arc::new(ScalarTranslatorFactory),
        Arc::new(AnyTranslatorFactory),
    ]
}

/// Elements of a repeated-property node.
///
/// `None` for a null node or an empty list. A lone non-list value is
/// treated as a one-element list, since the backend may hand back a single
/// value for a one-element property.
pub(crate) fn list_items(node: &Value) -> Option<&[Value]> {
    match node {
        Value::Null => None,
        Value::List(items) if items.is_empty() => None,
        Value::List(items) => Some(items),
        other => Some(std::slice::from_ref(other)),
    }
}
