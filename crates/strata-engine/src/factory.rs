use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use strata_translate::{ClassMetadata, MappingConfig, Mapper, Translators};
use strata_types::Object;
use tracing::debug;

use crate::entity::{EntityMetadata, KeyMetadata};
use crate::error::{EngineError, EngineResult};

/// Entity registry and owner of the translator registry.
///
/// Entity metadata is built on first use, so entities and the embedded
/// classes they refer to can be registered in any order. Every registration
/// drops the built metadata.
pub struct Factory {
    translators: Translators,
    entities: HashMap<String, (Arc<ClassMetadata>, KeyMetadata)>,
    metadata: RwLock<HashMap<String, Arc<EntityMetadata>>>,
}

impl Factory {
    /// Create a factory using the default translator chain.
    pub fn new(config: MappingConfig) -> Self {
        Self::with_translators(Translators::with_default_factories(config))
    }

    /// Create a factory around a caller-assembled translator registry.
    pub fn with_translators(translators: Translators) -> Self {
        Self {
            translators,
            entities: HashMap::new(),
            metadata: RwLock::new(HashMap::new()),
        }
    }

    /// Register an entity class stored under `key.kind()`.
    ///
    /// The class is also usable as an embedded type.
    pub fn register_entity(&mut self, class: ClassMetadata, key: KeyMetadata) {
        let class = self.translators.register_class(class);
        debug!(class = class.name(), kind = key.kind(), "registered entity");
        self.entities.insert(class.name().to_string(), (class, key));
        self.invalidate();
    }

    /// Register a class that only appears embedded in other values.
    pub fn register_embedded(&mut self, class: ClassMetadata) {
        self.translators.register_class(class);
        self.invalidate();
    }

    /// Register a key mapper for `Mapify` fields.
    pub fn register_mapper(&mut self, name: impl Into<String>, mapper: Arc<dyn Mapper>) {
        self.translators.register_mapper(name, mapper);
        self.invalidate();
    }

    pub fn translators(&self) -> &Translators {
        &self.translators
    }

    /// Mutable access to the translator registry, e.g. to add factories.
    pub fn translators_mut(&mut self) -> &mut Translators {
        self.invalidate();
        &mut self.translators
    }

    /// Metadata for the entity class named `class`.
    pub fn metadata(&self, class: &str) -> EngineResult<Arc<EntityMetadata>> {
        if let Some(meta) = self.metadata.read().expect("lock poisoned").get(class) {
            return Ok(Arc::clone(meta));
        }
        let (declared, key) = self
            .entities
            .get(class)
            .ok_or_else(|| EngineError::UnregisteredClass(class.to_string()))?;
        let meta = Arc::new(EntityMetadata::create(
            Arc::clone(declared),
            key.clone(),
            &self.translators,
        )?);
        self.metadata
            .write()
            .expect("lock poisoned")
            .insert(class.to_string(), Arc::clone(&meta));
        Ok(meta)
    }

    /// Metadata for the class of `object`.
    pub fn metadata_for(&self, object: &Object) -> EngineResult<Arc<EntityMetadata>> {
        match object.as_instance() {
            Some(instance) => self.metadata(instance.class()),
            None => Err(EngineError::NotAnEntity(object.type_name().to_string())),
        }
    }

    fn invalidate(&mut self) {
        self.metadata.get_mut().expect("lock poisoned").clear();
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::new(MappingConfig::default())
    }
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("entities", &self.entities.len())
            .field("translators", &self.translators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::IdKind;
    use strata_translate::{FieldMetadata, TypeDesc};
    use strata_types::Instance;

    fn owner() -> ClassMetadata {
        ClassMetadata::new("Owner")
            .field(FieldMetadata::new("id", TypeDesc::Integer))
            .field(FieldMetadata::new("home", TypeDesc::embedded("Address")))
    }

    fn address() -> ClassMetadata {
        ClassMetadata::new("Address").field(FieldMetadata::new("city", TypeDesc::Text))
    }

    #[test]
    fn registration_order_does_not_matter() {
        let mut factory = Factory::default();
        factory.register_entity(owner(), KeyMetadata::new("Owner", "id", IdKind::Long));
        factory.register_embedded(address());
        let meta = factory
            .metadata_for(&Object::from(Instance::new("Owner")))
            .unwrap();
        assert_eq!(meta.class().name(), "Owner");
    }

    #[test]
    fn missing_embedded_class_surfaces_on_lookup() {
        let mut factory = Factory::default();
        factory.register_entity(owner(), KeyMetadata::new("Owner", "id", IdKind::Long));
        let err = factory.metadata("Owner").unwrap_err();
        assert!(matches!(err, EngineError::Translate(_)));
    }

    #[test]
    fn metadata_is_shared_until_registration() {
        let mut factory = Factory::default();
        factory.register_embedded(address());
        factory.register_entity(owner(), KeyMetadata::new("Owner", "id", IdKind::Long));
        let a = factory.metadata("Owner").unwrap();
        let b = factory.metadata("Owner").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        factory.register_embedded(address());
        let c = factory.metadata("Owner").unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn unknown_classes_and_non_instances_fail() {
        let factory = Factory::default();
        assert!(matches!(
            factory.metadata_for(&Object::from(Instance::new("Ghost"))),
            Err(EngineError::UnregisteredClass(_))
        ));
        assert!(matches!(
            factory.metadata_for(&Object::from("text")),
            Err(EngineError::NotAnEntity(_))
        ));
    }
}
