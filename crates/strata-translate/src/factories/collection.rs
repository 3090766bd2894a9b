use std::sync::Arc;

use strata_types::{Collection, CollectionKind, Object, Path, Value};

use crate::error::{TranslateError, TranslateResult};
use crate::factories::list_items;
use crate::registry::{CreateContext, TranslatorFactory};
use crate::translator::{LoadContext, SaveContext, Translated, Translator};
use crate::types::{Annotations, TypeDesc};

/// Produces translators for ordered and unordered collections.
///
/// Elements are translated by one component translator resolved up front
/// for the declared element type (`Any` when the type is erased).
pub struct CollectionTranslatorFactory;

impl TranslatorFactory for CollectionTranslatorFactory {
    fn name(&self) -> &str {
        "collection"
    }

    fn create(
        &self,
        ty: &TypeDesc,
        annotations: &Annotations,
        ctx: &mut CreateContext<'_>,
        path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>> {
        let TypeDesc::Collection { kind, .. } = ty else {
            return Ok(None);
        };
        let element = ty.element_type().unwrap_or(TypeDesc::Any);
        // Field annotations apply to each element, so a mapified list of
        // maps stores every element map as a value list.
        let component = ctx.resolve(&element, annotations, path)?;
        Ok(Some(Arc::new(CollectionTranslator {
            kind: *kind,
            component,
        })))
    }
}

/// Stores a collection as a repeated property.
///
/// On load an existing collection in the field is recycled: it keeps its
/// kind (and therefore its ordering) and is refilled in place. Elements are
/// translated into a scratch collection first, so an element error leaves
/// the existing collection as it was.
struct CollectionTranslator {
    kind: CollectionKind,
    component: Arc<dyn Translator>,
}

impl Translator for CollectionTranslator {
    fn load(
        &self,
        node: &Value,
        existing: Option<&mut Object>,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>> {
        // The backend does not store empty lists, so there is nothing to load.
        let Some(items) = list_items(node) else {
            return Ok(Translated::Skip);
        };

        let kind = match existing.as_deref() {
            Some(Object::Collection(current)) => current.kind(),
            _ => self.kind,
        };
        let mut loaded = Collection::with_capacity(kind, items.len());
        for (i, child) in items.iter().enumerate() {
            if let Translated::Value(value) = self.component.load(child, None, ctx, &path.index(i))? {
                loaded.add(value);
            }
        }

        match existing {
            Some(Object::Collection(current)) => {
                current.clear();
                for value in loaded.iter() {
                    current.add(value.clone());
                }
                // Refilled in place; no need to reassign the field.
                Ok(Translated::Skip)
            }
            _ => Ok(Translated::Value(Object::Collection(loaded))),
        }
    }

    fn save(
        &self,
        object: &Object,
        index: bool,
        ctx: &SaveContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Value>> {
        let collection = match object {
            Object::Null => return Ok(Translated::Skip),
            Object::Collection(collection) => collection,
            other => return Err(TranslateError::mismatch(path, "collection", other.type_name())),
        };
        if collection.is_empty() {
            return Ok(Translated::Skip);
        }

        let mut list = Vec::with_capacity(collection.len());
        for (i, item) in collection.iter().enumerate() {
            if let Translated::Value(node) = self.component.save(item, index, ctx, &path.index(i))? {
                list.push(node);
            }
        }

        if list.is_empty() {
            return Ok(Translated::Skip);
        }
        Ok(Translated::Value(Value::List(list)))
    }
}
