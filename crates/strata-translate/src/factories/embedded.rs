use std::sync::Arc;

use strata_types::{Instance, Object, Path, PropertyMap, Value};

use crate::error::{TranslateError, TranslateResult};
use crate::metadata::{ClassMetadata, FieldMetadata};
use crate::registry::{CreateContext, TranslatorFactory};
use crate::translator::{LoadContext, SaveContext, Translated, Translator};
use crate::types::{Annotations, TypeDesc};

// ---------------------------------------------------------------------------
// ClassTranslator
// ---------------------------------------------------------------------------

struct BoundField {
    meta: FieldMetadata,
    translator: Arc<dyn Translator>,
}

/// Field-by-field translation of a class instance to and from a property map.
///
/// Used for embedded values and, at the root, for whole entities.
pub struct ClassTranslator {
    class: Arc<ClassMetadata>,
    fields: Vec<BoundField>,
}

impl ClassTranslator {
    /// Resolve a translator for every declared field of `class`.
    pub fn create(
        class: Arc<ClassMetadata>,
        ctx: &mut CreateContext<'_>,
        path: &Path,
    ) -> TranslateResult<Self> {
        let mut fields = Vec::with_capacity(class.fields().len());
        for meta in class.fields() {
            let translator = ctx.resolve(&meta.ty, &meta.annotations, &path.extend(&meta.name))?;
            fields.push(BoundField {
                meta: meta.clone(),
                translator,
            });
        }
        Ok(Self { class, fields })
    }

    pub fn class(&self) -> &ClassMetadata {
        &self.class
    }

    /// Write every non-skipped field of `instance` into `props`.
    ///
    /// Field annotations override the inherited `index` flag.
    pub fn save_into(
        &self,
        instance: &Instance,
        index: bool,
        ctx: &SaveContext<'_>,
        path: &Path,
        props: &mut PropertyMap,
    ) -> TranslateResult<()> {
        for field in &self.fields {
            let name = &field.meta.name;
            let value = instance.get(name).unwrap_or(&Object::Null);
            let indexed = field.meta.annotations.index_override().unwrap_or(index);
            if let Translated::Value(node) =
                field.translator.save(value, indexed, ctx, &path.extend(name))?
            {
                props.set(name.as_str(), node, indexed);
            }
        }
        Ok(())
    }

    /// Load every present property of `props` into `instance`.
    ///
    /// Absent properties and skipped loads leave the field as it was.
    pub fn load_into(
        &self,
        props: &PropertyMap,
        instance: &mut Instance,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<()> {
        for field in &self.fields {
            let name = &field.meta.name;
            let Some(node) = props.get(name) else {
                continue;
            };
            let outcome =
                field
                    .translator
                    .load(node, instance.get_mut(name), ctx, &path.extend(name))?;
            if let Translated::Value(value) = outcome {
                instance.set(name.as_str(), value);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmbeddedTranslatorFactory
// ---------------------------------------------------------------------------

/// Produces translators for registered classes stored as embedded maps.
pub struct EmbeddedTranslatorFactory;

impl TranslatorFactory for EmbeddedTranslatorFactory {
    fn name(&self) -> &str {
        "embedded"
    }

    fn create(
        &self,
        ty: &TypeDesc,
        _annotations: &Annotations,
        ctx: &mut CreateContext<'_>,
        path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>> {
        let TypeDesc::Embedded(class_name) = ty else {
            return Ok(None);
        };
        let class = ctx
            .classes()
            .get(class_name)
            .ok_or_else(|| TranslateError::UnregisteredClass {
                path: path.to_string(),
                class: class_name.clone(),
            })?;
        let inner = ClassTranslator::create(class, ctx, path)?;
        Ok(Some(Arc::new(EmbeddedTranslator { inner })))
    }
}

struct EmbeddedTranslator {
    inner: ClassTranslator,
}

impl Translator for EmbeddedTranslator {
    fn load(
        &self,
        node: &Value,
        existing: Option<&mut Object>,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>> {
        let props = match node {
            Value::Null => return Ok(Translated::Skip),
            Value::Embedded(props) => props,
            other => return Err(TranslateError::mismatch(path, "embedded", other.type_name())),
        };

        let class = self.inner.class().name();
        match existing {
            Some(Object::Instance(current)) if current.class() == class => {
                self.inner.load_into(props, current, ctx, path)?;
                Ok(Translated::Skip)
            }
            _ => {
                let mut instance = Instance::new(class);
                self.inner.load_into(props, &mut instance, ctx, path)?;
                Ok(Translated::Value(Object::Instance(instance)))
            }
        }
    }

    fn save(
        &self,
        object: &Object,
        index: bool,
        ctx: &SaveContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Value>> {
        let class = self.inner.class().name();
        let instance = match object {
            Object::Null => return Ok(Translated::Skip),
            Object::Instance(instance) if instance.class() == class => instance,
            Object::Instance(instance) => {
                return Err(TranslateError::mismatch(path, class, instance.class()))
            }
            other => return Err(TranslateError::mismatch(path, class, other.type_name())),
        };

        let mut props = PropertyMap::new();
        self.inner.save_into(instance, index, ctx, path, &mut props)?;
        Ok(Translated::Value(Value::Embedded(props)))
    }
}
