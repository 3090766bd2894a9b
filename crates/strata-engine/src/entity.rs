use std::sync::Arc;

use strata_translate::{
    ClassMetadata, ClassTranslator, LoadContext, MappingConfig, SaveContext, Translated,
    Translators, TypeDesc,
};
use strata_types::{Instance, KeyId, Object, Path, PropertyMap, RawKey, Record};

use crate::error::{EngineError, EngineResult};

// ---------------------------------------------------------------------------
// KeyMetadata
// ---------------------------------------------------------------------------

/// How an entity's id field is typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdKind {
    /// Numeric id; the backend assigns one when the field is unset.
    Long,
    /// Caller-assigned text id.
    Name,
}

impl IdKind {
    /// The declared field type an id of this kind must have.
    pub fn field_type(self) -> TypeDesc {
        match self {
            Self::Long => TypeDesc::Integer,
            Self::Name => TypeDesc::Text,
        }
    }
}

/// Where an entity keeps its identity and which record kind it maps to.
#[derive(Clone, Debug)]
pub struct KeyMetadata {
    kind: String,
    id_field: String,
    id_kind: IdKind,
}

impl KeyMetadata {
    pub fn new(kind: impl Into<String>, id_field: impl Into<String>, id_kind: IdKind) -> Self {
        Self {
            kind: kind.into(),
            id_field: id_field.into(),
            id_kind,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn id_kind(&self) -> IdKind {
        self.id_kind
    }

    /// Returns `true` if the backend may assign the id.
    pub fn is_id_generatable(&self) -> bool {
        self.id_kind == IdKind::Long
    }

    /// Returns `true` if `object` is waiting for a backend-assigned id.
    pub fn needs_id(&self, object: &Object) -> bool {
        self.is_id_generatable()
            && object
                .as_instance()
                .is_some_and(|i| i.get(&self.id_field).map_or(true, Object::is_null))
    }

    /// Write a backend-assigned numeric id into the id field.
    pub fn set_long_id(&self, object: &mut Object, id: i64) {
        if let Some(instance) = object.as_instance_mut() {
            instance.set(self.id_field.as_str(), id);
        }
    }

    /// Build the record key for `object` from its id field.
    ///
    /// An unset numeric id yields an incomplete key.
    pub fn raw_key(&self, object: &Object) -> EngineResult<RawKey> {
        let Some(instance) = object.as_instance() else {
            return Err(EngineError::NotAnEntity(object.type_name().to_string()));
        };
        match (self.id_kind, instance.get(&self.id_field).unwrap_or(&Object::Null)) {
            (IdKind::Long, Object::Null) => Ok(RawKey::incomplete(self.kind.as_str())),
            (IdKind::Long, Object::Integer(id)) => Ok(RawKey::with_id(self.kind.as_str(), *id)),
            (IdKind::Name, Object::Text(name)) => {
                Ok(RawKey::with_name(self.kind.as_str(), name.as_str()))
            }
            (IdKind::Name, Object::Null) => Err(self.invalid(instance, "name id is not set")),
            (_, other) => Err(self.invalid(
                instance,
                format!("id field {} holds a {}", self.id_field, other.type_name()),
            )),
        }
    }

    /// The id field value carried by a stored record's key.
    pub fn id_value(&self, key: &RawKey) -> EngineResult<Object> {
        match (self.id_kind, key.id()) {
            (IdKind::Long, KeyId::Id(id)) => Ok(Object::Integer(*id)),
            (IdKind::Name, KeyId::Name(name)) => Ok(Object::Text(name.clone())),
            _ => Err(EngineError::InvalidEntity {
                class: self.kind.clone(),
                reason: format!("key {key} does not carry a {:?} id", self.id_kind),
            }),
        }
    }

    fn invalid(&self, instance: &Instance, reason: impl Into<String>) -> EngineError {
        EngineError::InvalidEntity {
            class: instance.class().to_string(),
            reason: reason.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// EntityMetadata
// ---------------------------------------------------------------------------

/// Everything needed to turn one entity class into records and back.
///
/// The id field lives in the record key, so the property translator covers
/// every other field.
pub struct EntityMetadata {
    class: Arc<ClassMetadata>,
    key: KeyMetadata,
    properties: ClassTranslator,
    config: MappingConfig,
}

impl EntityMetadata {
    pub fn create(
        class: Arc<ClassMetadata>,
        key: KeyMetadata,
        translators: &Translators,
    ) -> EngineResult<Self> {
        let declared = class
            .field_named(key.id_field())
            .ok_or_else(|| EngineError::InvalidEntity {
                class: class.name().to_string(),
                reason: format!("no id field {:?}", key.id_field()),
            })?;
        if declared.ty != key.id_kind().field_type() {
            return Err(EngineError::InvalidEntity {
                class: class.name().to_string(),
                reason: format!("id field {} is declared as {}", declared.name, declared.ty),
            });
        }

        let without_id = Arc::new(class.without_field(key.id_field()));
        let properties = translators.class_translator(without_id, &Path::root())?;
        Ok(Self {
            class,
            key,
            properties,
            config: translators.config().clone(),
        })
    }

    pub fn class(&self) -> &ClassMetadata {
        &self.class
    }

    pub fn key(&self) -> &KeyMetadata {
        &self.key
    }

    /// Translate an entity into a record. The entity is not modified.
    pub fn save(&self, object: &Object) -> EngineResult<Record> {
        let instance = self.instance(object)?;
        let key = self.key.raw_key(object)?;
        let mut props = PropertyMap::new();
        self.properties.save_into(
            instance,
            self.config.index_by_default,
            &SaveContext::new(&self.config),
            &Path::root(),
            &mut props,
        )?;
        Ok(Record::with_properties(key, props))
    }

    /// Translate a record back into an entity.
    ///
    /// With an `existing` instance of the same class the record is loaded in
    /// place and the result is `Skip`: fields absent from the record keep
    /// their current values. Otherwise a fresh instance is returned.
    pub fn load(
        &self,
        record: &Record,
        existing: Option<&mut Object>,
    ) -> EngineResult<Translated<Object>> {
        if record.key().kind() != self.key.kind() {
            return Err(EngineError::InvalidEntity {
                class: self.class.name().to_string(),
                reason: format!("cannot load a record of kind {}", record.key().kind()),
            });
        }
        let id = self.key.id_value(record.key())?;
        let ctx = LoadContext::new(&self.config);

        match existing {
            Some(object) => {
                let found = describe(object);
                let instance = object
                    .as_instance_mut()
                    .filter(|i| i.class() == self.class.name())
                    .ok_or_else(|| EngineError::InvalidEntity {
                        class: self.class.name().to_string(),
                        reason: format!("cannot reload into {found}"),
                    })?;
                self.properties
                    .load_into(record.properties(), instance, &ctx, &Path::root())?;
                instance.set(self.key.id_field(), id);
                Ok(Translated::Skip)
            }
            None => {
                let mut instance = Instance::new(self.class.name());
                self.properties
                    .load_into(record.properties(), &mut instance, &ctx, &Path::root())?;
                instance.set(self.key.id_field(), id);
                Ok(Translated::Value(Object::Instance(instance)))
            }
        }
    }

    fn instance<'a>(&self, object: &'a Object) -> EngineResult<&'a Instance> {
        match object.as_instance() {
            Some(instance) if instance.class() == self.class.name() => Ok(instance),
            _ => Err(EngineError::InvalidEntity {
                class: self.class.name().to_string(),
                reason: format!("cannot save {}", describe(object)),
            }),
        }
    }
}

impl std::fmt::Debug for EntityMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadata")
            .field("class", &self.class.name())
            .field("key", &self.key)
            .finish()
    }
}

fn describe(object: &Object) -> String {
    match object.as_instance() {
        Some(instance) => format!("an instance of {}", instance.class()),
        None => format!("a {}", object.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_translate::{Annotation, FieldMetadata};
    use strata_types::{Collection, Value};

    fn person_class() -> ClassMetadata {
        ClassMetadata::new("Person")
            .field(FieldMetadata::new("id", TypeDesc::Integer))
            .field(FieldMetadata::new("name", TypeDesc::Text).annotated(Annotation::Index))
            .field(FieldMetadata::new("tags", TypeDesc::list_of(TypeDesc::Text)))
    }

    fn metadata() -> EntityMetadata {
        let mut translators = Translators::with_default_factories(MappingConfig::default());
        let class = translators.register_class(person_class());
        EntityMetadata::create(
            class,
            KeyMetadata::new("Person", "id", IdKind::Long),
            &translators,
        )
        .unwrap()
    }

    fn ada() -> Object {
        Object::from(
            Instance::new("Person")
                .with("name", "ada")
                .with("tags", Collection::list(vec![Object::from("math")])),
        )
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    #[test]
    fn unset_long_id_gives_incomplete_key() {
        let key = KeyMetadata::new("Person", "id", IdKind::Long);
        assert!(key.is_id_generatable());
        assert!(key.needs_id(&ada()));
        assert_eq!(key.raw_key(&ada()).unwrap(), RawKey::incomplete("Person"));
    }

    #[test]
    fn set_long_id_fills_field() {
        let key = KeyMetadata::new("Person", "id", IdKind::Long);
        let mut object = ada();
        key.set_long_id(&mut object, 7);
        assert!(!key.needs_id(&object));
        assert_eq!(key.raw_key(&object).unwrap(), RawKey::with_id("Person", 7));
    }

    #[test]
    fn name_ids_must_be_set() {
        let key = KeyMetadata::new("Tag", "label", IdKind::Name);
        assert!(!key.is_id_generatable());
        let err = key.raw_key(&Object::from(Instance::new("Tag"))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidEntity { .. }));
        let named = Object::from(Instance::new("Tag").with("label", "red"));
        assert_eq!(key.raw_key(&named).unwrap(), RawKey::with_name("Tag", "red"));
    }

    #[test]
    fn id_type_mismatch_rejected_at_creation() {
        let mut translators = Translators::with_default_factories(MappingConfig::default());
        let class = translators.register_class(person_class());
        let err = EntityMetadata::create(
            class,
            KeyMetadata::new("Person", "id", IdKind::Name),
            &translators,
        )
        .unwrap_err();
        assert!(err.to_string().contains("declared as integer"));
    }

    // -----------------------------------------------------------------------
    // Save / load
    // -----------------------------------------------------------------------

    #[test]
    fn save_keeps_id_out_of_properties() {
        let mut object = ada();
        let meta = metadata();
        meta.key().set_long_id(&mut object, 3);
        let record = meta.save(&object).unwrap();
        assert_eq!(record.key(), &RawKey::with_id("Person", 3));
        assert!(record.get("id").is_none());
        assert_eq!(record.get("name"), Some(&Value::Text("ada".into())));
        assert!(record.property("name").unwrap().indexed);
        assert!(!record.property("tags").unwrap().indexed);
    }

    #[test]
    fn empty_collections_are_not_written() {
        let object = Object::from(
            Instance::new("Person")
                .with("name", "bob")
                .with("tags", Collection::list(vec![])),
        );
        let record = metadata().save(&object).unwrap();
        assert!(record.get("tags").is_none());
    }

    #[test]
    fn load_builds_fresh_instance() {
        let meta = metadata();
        let mut record = meta.save(&ada()).unwrap();
        record.set_key(RawKey::with_id("Person", 9));
        let loaded = meta.load(&record, None).unwrap().into_option().unwrap();
        let instance = loaded.as_instance().unwrap();
        assert_eq!(instance.get("id"), Some(&Object::Integer(9)));
        assert_eq!(instance.get("name"), Some(&Object::from("ada")));
    }

    #[test]
    fn reload_in_place_keeps_absent_fields() {
        let meta = metadata();
        let mut record = Record::new(RawKey::with_id("Person", 4));
        record.set_property("name", Value::Text("grace".into()), true);

        let mut existing = ada();
        let outcome = meta.load(&record, Some(&mut existing)).unwrap();
        assert!(outcome.is_skip());
        let instance = existing.as_instance().unwrap();
        assert_eq!(instance.get("name"), Some(&Object::from("grace")));
        assert_eq!(instance.get("id"), Some(&Object::Integer(4)));
        assert_eq!(
            instance.get("tags"),
            Some(&Object::from(Collection::list(vec![Object::from("math")])))
        );
    }

    #[test]
    fn reload_into_other_class_is_an_error() {
        let meta = metadata();
        let record = Record::new(RawKey::with_id("Person", 1));
        let mut other = Object::from(Instance::new("Car"));
        let err = meta.load(&record, Some(&mut other)).unwrap_err();
        assert!(err.to_string().contains("an instance of Car"));
    }

    #[test]
    fn load_rejects_foreign_kind() {
        let record = Record::new(RawKey::with_id("Car", 1));
        assert!(metadata().load(&record, None).is_err());
    }
}
