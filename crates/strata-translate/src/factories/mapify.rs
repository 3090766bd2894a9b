use std::sync::Arc;

use strata_types::{MapKind, Object, ObjectMap, Path, Value};

use crate::error::{TranslateError, TranslateResult};
use crate::factories::list_items;
use crate::mapper::Mapper;
use crate::registry::{CreateContext, TranslatorFactory};
use crate::translator::{LoadContext, SaveContext, Translated, Translator};
use crate::types::{Annotations, TypeDesc};

/// Produces translators for `Mapify`-annotated map fields.
///
/// Only the map's values are stored, as a repeated property. On load the
/// named key mapper derives each key from the loaded value.
pub struct MapifyTranslatorFactory;

impl TranslatorFactory for MapifyTranslatorFactory {
    fn name(&self) -> &str {
        "mapify"
    }

    fn create(
        &self,
        ty: &TypeDesc,
        annotations: &Annotations,
        ctx: &mut CreateContext<'_>,
        path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>> {
        let Some(mapper_name) = annotations.mapify() else {
            return Ok(None);
        };
        let TypeDesc::Map { kind, .. } = ty else {
            return Ok(None);
        };

        let mapper = ctx
            .mappers()
            .get(mapper_name)
            .ok_or_else(|| TranslateError::UnknownMapper {
                path: path.to_string(),
                name: mapper_name.to_string(),
            })?;
        let value_type = ty.map_value_type().unwrap_or(TypeDesc::Any);
        let component = ctx.resolve(&value_type, &annotations.without_mapify(), path)?;

        Ok(Some(Arc::new(MapifyTranslator {
            kind: *kind,
            component,
            mapper,
        })))
    }
}

struct MapifyTranslator {
    kind: MapKind,
    component: Arc<dyn Translator>,
    mapper: Arc<dyn Mapper>,
}

impl Translator for MapifyTranslator {
    fn load(
        &self,
        node: &Value,
        existing: Option<&mut Object>,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>> {
        let Some(items) = list_items(node) else {
            return Ok(Translated::Skip);
        };

        let kind = match existing.as_deref() {
            Some(Object::Map(current)) => current.kind(),
            _ => self.kind,
        };
        let mut loaded = ObjectMap::new(kind);
        for (i, child) in items.iter().enumerate() {
            let child_path = path.index(i);
            if let Translated::Value(value) = self.component.load(child, None, ctx, &child_path)? {
                let key = self.mapper.key_of(&value, &child_path)?;
                // Later duplicates win.
                loaded.insert(key, value);
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
        if map.is_empty() {
            return Ok(Translated::Skip);
        }

        // Keys are not stored; the mapper rebuilds them on load.
        let mut list = Vec::with_capacity(map.len());
        for (i, value) in map.values().enumerate() {
            if let Translated::Value(node) = self.component.save(value, index, ctx, &path.index(i))? {
                list.push(node);
            }
        }

        if list.is_empty() {
            return Ok(Translated::Skip);
        }
        Ok(Translated::Value(Value::List(list)))
    }
}
