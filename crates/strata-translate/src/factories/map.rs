use std::sync::Arc;

use strata_types::{MapKind, Object, ObjectMap, Path, PropertyMap, Value};

use crate::error::{TranslateError, TranslateResult};
use crate::registry::{CreateContext, TranslatorFactory};
use crate::translator::{LoadContext, SaveContext, Translated, Translator};
use crate::types::{Annotations, TypeDesc};

/// Produces translators for plain (un-mapified) maps with text keys.
///
/// The map is stored as an embedded property map: each key becomes a
/// property name holding the translated value.
pub struct MapTranslatorFactory;

impl TranslatorFactory for MapTranslatorFactory {
    fn name(&self) -> &str {
        "map"
    }

    fn create(
        &self,
        ty: &TypeDesc,
        annotations: &Annotations,
        ctx: &mut CreateContext<'_>,
        path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>> {
        let TypeDesc::Map { kind, .. } = ty else {
            return Ok(None);
        };
        let value_type = ty.map_value_type().unwrap_or(TypeDesc::Any);
        let component = ctx.resolve(&value_type, annotations, path)?;
        Ok(Some(Arc::new(MapTranslator {
            kind: *kind,
            component,
        })))
    }
}

struct MapTranslator {
    kind: MapKind,
    component: Arc<dyn Translator>,
}

impl Translator for MapTranslator {
    fn load(
        &self,
        node: &Value,
        existing: Option<&mut Object>,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>> {
        let props = match node {
            Value::Null => return Ok(Translated::Skip),
            Value::Embedded(props) if props.is_empty() => return Ok(Translated::Skip),
            Value::Embedded(props) => props,
            other => return Err(TranslateError::mismatch(path, "embedded", other.type_name())),
        };

        let kind = match existing.as_deref() {
            Some(Object::Map(current)) => current.kind(),
            _ => self.kind,
        };
        let mut loaded = ObjectMap::new(kind);
        for (name, prop) in props.iter() {
            if let Translated::Value(value) =
                self.component.load(&prop.value, None, ctx, &path.extend(name))?
            {
                loaded.insert(Object::from(name), value);
            }
        }

        match existing {
            Some(Object::Map(current)) => {
                current.clear();
                for (key, value) in loaded.iter() {
                    current.insert(key.clone(), value.clone());
                }
                Ok(Translated::Skip)
            }
            _ => Ok(Translated::Value(Object::Map(loaded))),
        }
    }

    fn save(
        &self,
        object: &Object,
        index: bool,
        ctx: &SaveContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Value>> {
        let map = match object {
            Object::Null => return Ok(Translated::Skip),
            Object::Map(map) => map,
            other => return Err(TranslateError::mismatch(path, "map", other.type_name())),
        };

        let mut props = PropertyMap::new();
        for (key, value) in map.iter() {
            let Object::Text(name) = key else {
                return Err(TranslateError::mismatch(path, "text map key", key.type_name()));
            };
            if let Translated::Value(node) = self.component.save(value, index, ctx, &path.extend(name))? {
                props.set(name.as_str(), node, index);
            }
        }

        if props.is_empty() {
            return Ok(Translated::Skip);
        }
        Ok(Translated::Value(Value::Embedded(props)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MappingConfig;
    use crate::registry::Translators;

    fn translator() -> Arc<dyn Translator> {
        Translators::with_default_factories(MappingConfig::default())
            .get(
                &TypeDesc::map_of(MapKind::Linked, TypeDesc::Integer),
                &Annotations::none(),
                &Path::root().extend("scores"),
            )
            .unwrap()
    }

    fn scores(entries: &[(&str, i64)]) -> Object {
        let mut map = ObjectMap::new(MapKind::Linked);
        for (k, v) in entries {
            map.insert(Object::from(*k), Object::Integer(*v));
        }
        Object::Map(map)
    }

    #[test]
    fn roundtrip_through_embedded_properties() {
        let t = translator();
        let config = MappingConfig::default();
        let source = scores(&[("alice", 3), ("bob", 5)]);
        let node = t
            .save(&source, true, &SaveContext::new(&config), &Path::root())
            .unwrap()
            .into_option()
            .unwrap();
        assert!(matches!(&node, Value::Embedded(props) if props.len() == 2));

        let loaded = t
            .load(&node, None, &LoadContext::new(&config), &Path::root())
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(loaded.as_map().unwrap().get(&Object::from("bob")), Some(&Object::Integer(5)));
    }

    #[test]
    fn null_values_are_dropped_and_empty_result_skips() {
        let t = translator();
        let config = MappingConfig::default();
        let mut map = ObjectMap::new(MapKind::Linked);
        map.insert(Object::from("gone"), Object::Null);
        let saved = t
            .save(&Object::Map(map), true, &SaveContext::new(&config), &Path::root())
            .unwrap();
        assert!(saved.is_skip());
    }

    #[test]
    fn non_text_key_is_an_error() {
        let t = translator();
        let config = MappingConfig::default();
        let mut map = ObjectMap::new(MapKind::Linked);
        map.insert(Object::Integer(1), Object::Integer(1));
        let err = t
            .save(&Object::Map(map), true, &SaveContext::new(&config), &Path::root().extend("scores"))
            .unwrap_err();
        assert!(err.to_string().contains("text map key"));
    }

    #[test]
    fn existing_map_is_refilled() {
        let t = translator();
        let config = MappingConfig::default();
        let mut existing = scores(&[("stale", 1)]);
        let mut props = PropertyMap::new();
        props.set("fresh", Value::Integer(2), false);
        let outcome = t
            .load(&Value::Embedded(props), Some(&mut existing), &LoadContext::new(&config), &Path::root())
            .unwrap();
        assert!(outcome.is_skip());
        assert_eq!(existing, scores(&[("fresh", 2)]));
    }
}
