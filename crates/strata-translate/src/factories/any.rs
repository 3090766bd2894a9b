use std::sync::Arc;

use strata_types::{Collection, CollectionKind, MapKind, Object, ObjectMap, Path, PropertyMap, Value};

use crate::error::{TranslateError, TranslateResult};
use crate::registry::{CreateContext, TranslatorFactory};
use crate::translator::{LoadContext, SaveContext, Translated, Translator};
use crate::types::{Annotations, TypeDesc};

/// Produces the translator for unconstrained (`Any`) values, which are
/// translated by inspecting the runtime variant.
///
/// Nested collections become lists and text-keyed maps become embedded
/// maps. Class instances need a declared embedded type and are rejected.
pub struct AnyTranslatorFactory;

impl TranslatorFactory for AnyTranslatorFactory {
    fn name(&self) -> &str {
        "any"
    }

    fn create(
        &self,
        ty: &TypeDesc,
        _annotations: &Annotations,
        _ctx: &mut CreateContext<'_>,
        _path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>> {
        if *ty != TypeDesc::Any {
            return Ok(None);
        }
        Ok(Some(Arc::new(AnyTranslator)))
    }
}

struct AnyTranslator;

impl AnyTranslator {
    fn load_node(&self, node: &Value, path: &Path) -> TranslateResult<Option<Object>> {
        let object = match node {
            Value::Null => return Ok(None),
            Value::Bool(v) => Object::Bool(*v),
            Value::Integer(v) => Object::Integer(*v),
            Value::Float(v) => Object::Float(*v),
            Value::Text(v) => Object::Text(v.clone()),
            Value::Bytes(v) => Object::Bytes(v.clone()),
            Value::Key(v) => Object::Key(v.clone()),
            Value::List(items) => {
                let mut collection = Collection::with_capacity(CollectionKind::List, items.len());
                for (i, item) in items.iter().enumerate() {
                    if let Some(object) = self.load_node(item, &path.index(i))? {
                        collection.add(object);
                    }
                }
                Object::Collection(collection)
            }
            Value::Embedded(props) => {
                let mut map = ObjectMap::new(MapKind::Linked);
                for (name, prop) in props.iter() {
                    if let Some(object) = self.load_node(&prop.value, &path.extend(name))? {
                        map.insert(Object::from(name), object);
                    }
                }
                Object::Map(map)
            }
        };
        Ok(Some(object))
    }

    fn save_object(&self, object: &Object, index: bool, path: &Path) -> TranslateResult<Option<Value>> {
        let node = match object {
            Object::Null => return Ok(None),
            Object::Bool(v) => Value::Bool(*v),
            Object::Integer(v) => Value::Integer(*v),
            Object::Float(v) => Value::Float(*v),
            Object::Text(v) => Value::Text(v.clone()),
            Object::Bytes(v) => Value::Bytes(v.clone()),
            Object::Key(v) => Value::Key(v.clone()),
            Object::Collection(collection) => {
                let mut list = Vec::with_capacity(collection.len());
                for (i, item) in collection.iter().enumerate() {
                    if let Some(node) = self.save_object(item, index, &path.index(i))? {
                        list.push(node);
                    }
                }
                if list.is_empty() {
                    return Ok(None);
                }
                Value::List(list)
            }
            Object::Map(map) => {
                let mut props = PropertyMap::new();
                for (key, value) in map.iter() {
                    let Object::Text(name) = key else {
                        return Err(TranslateError::mismatch(path, "text map key", key.type_name()));
                    };
                    if let Some(node) = self.save_object(value, index, &path.extend(name))? {
                        props.set(name.as_str(), node, index);
                    }
                }
                if props.is_empty() {
                    return Ok(None);
                }
                Value::Embedded(props)
            }
            Object::Instance(instance) => {
                return Err(TranslateError::NoTranslator {
                    path: path.to_string(),
                    ty: format!("undeclared instance of {}", instance.class()),
                })
            }
        };
        Ok(Some(node))
    }
}

impl Translator for AnyTranslator {
    fn load(
        &self,
        node: &Value,
        _existing: Option<&mut Object>,
        _ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>> {
        if node.is_absent() {
            return Ok(Translated::Skip);
        }
        Ok(match self.load_node(node, path)? {
            Some(object) => Translated::Value(object),
            None => Translated::Skip,
        })
    }

    fn save(
        &self,
        object: &Object,
        index: bool,
        _ctx: &SaveContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Value>> {
        Ok(match self.save_object(object, index, path)? {
            Some(node) => Translated::Value(node),
            None => Translated::Skip,
        })
    }
}
