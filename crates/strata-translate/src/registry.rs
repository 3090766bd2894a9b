use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use strata_types::Path;
use tracing::debug;

use crate::config::MappingConfig;
use crate::error::{TranslateError, TranslateResult};
use crate::factories::{self, ClassTranslator};
use crate::mapper::{Mapper, Mappers};
use crate::metadata::{ClassMetadata, ClassRegistry};
use crate::translator::Translator;
use crate::types::{Annotations, TypeDesc};

// ---------------------------------------------------------------------------
// TranslatorFactory
// ---------------------------------------------------------------------------

/// One link in the translator chain.
///
/// A factory inspects the requested type and annotations and either
/// declines (`Ok(None)`) so the next factory is asked, or produces a
/// translator. Container factories resolve their component translators
/// through [`CreateContext::resolve`].
pub trait TranslatorFactory: Send + Sync {
    /// Human-readable factory name.
    fn name(&self) -> &str;

    fn create(
        &self,
        ty: &TypeDesc,
        annotations: &Annotations,
        ctx: &mut CreateContext<'_>,
        path: &Path,
    ) -> TranslateResult<Option<Arc<dyn Translator>>>;
}

// ---------------------------------------------------------------------------
// CreateContext
// ---------------------------------------------------------------------------

type Binding = (TypeDesc, Annotations);

/// Tracks one top-level translator resolution.
///
/// Bindings currently under construction are kept on a stack so a type that
/// refers back to itself is reported instead of recursing forever.
pub struct CreateContext<'a> {
    translators: &'a Translators,
    in_progress: Vec<Binding>,
}

impl<'a> CreateContext<'a> {
    fn new(translators: &'a Translators) -> Self {
        Self {
            translators,
            in_progress: Vec::new(),
        }
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.translators.classes
    }

    pub fn mappers(&self) -> &Mappers {
        &self.translators.mappers
    }

    pub fn config(&self) -> &MappingConfig {
        &self.translators.config
    }

    /// Resolve a translator for `ty`, reusing a cached binding if one exists.
    pub fn resolve(
        &mut self,
        ty: &TypeDesc,
        annotations: &Annotations,
        path: &Path,
    ) -> TranslateResult<Arc<dyn Translator>> {
        let translators = self.translators;
        let binding = (ty.clone(), annotations.clone());

        if let Some(hit) = translators
            .cache
            .read()
            .expect("translator cache lock poisoned")
            .get(&binding)
        {
            return Ok(Arc::clone(hit));
        }

        if self.in_progress.contains(&binding) {
            return Err(TranslateError::CyclicType {
                path: path.to_string(),
                ty: ty.to_string(),
            });
        }
        if self.in_progress.len() >= translators.config.max_depth {
            return Err(TranslateError::DepthExceeded {
                path: path.to_string(),
                max: translators.config.max_depth,
            });
        }

        self.in_progress.push(binding.clone());
        let created = self.create_uncached(ty, annotations, path);
        self.in_progress.pop();

        let translator = created?;
        translators
            .cache
            .write()
            .expect("translator cache lock poisoned")
            .insert(binding, Arc::clone(&translator));
        Ok(translator)
    }

    fn create_uncached(
        &mut self,
        ty: &TypeDesc,
        annotations: &Annotations,
        path: &Path,
    ) -> TranslateResult<Arc<dyn Translator>> {
        let translators = self.translators;
        for factory in &translators.factories {
            if let Some(translator) = factory.create(ty, annotations, self, path)? {
                debug!(ty = %ty, factory = factory.name(), "created translator");
                return Ok(translator);
            }
        }
        Err(TranslateError::NoTranslator {
            path: path.to_string(),
            ty: ty.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Translators
// ---------------------------------------------------------------------------

/// The translator registry: an ordered factory chain plus a binding cache.
///
/// Factories are asked in order and the first to produce a translator wins.
/// Produced translators are cached per `(type, annotations)` for the life of
/// the registry.
pub struct Translators {
    factories: Vec<Arc<dyn TranslatorFactory>>,
    cache: RwLock<HashMap<Binding, Arc<dyn Translator>>>,
    classes: ClassRegistry,
    mappers: Mappers,
    config: MappingConfig,
}

impl Translators {
    /// Create a registry with an empty factory chain.
    ///
    /// Use [`Self::add_factory`] to add factories, or
    /// [`Self::with_default_factories`] for the standard chain.
    pub fn new(config: MappingConfig) -> Self {
        Self {
            factories: Vec::new(),
            cache: RwLock::new(HashMap::new()),
            classes: ClassRegistry::new(),
            mappers: Mappers::new(),
            config,
        }
    }

    /// Create a registry with the standard chain:
    /// Mapify -> Collection -> Map -> Embedded -> Scalar -> Any
    pub fn with_default_factories(config: MappingConfig) -> Self {
        let mut translators = Self::new(config);
        for factory in factories::default_factories() {
            translators.add_factory(factory);
        }
        translators
    }

    /// Append a factory to the end of the chain.
    pub fn add_factory(&mut self, factory: Arc<dyn TranslatorFactory>) {
        self.factories.push(factory);
        self.invalidate();
    }

    /// Insert a factory at `index`, ahead of everything after it.
    pub fn insert_factory(&mut self, index: usize, factory: Arc<dyn TranslatorFactory>) {
        self.factories.insert(index, factory);
        self.invalidate();
    }

    /// Names of the factories in chain order.
    pub fn factory_names(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.name()).collect()
    }

    /// Register (or replace) a class for embedded translation.
    pub fn register_class(&mut self, class: ClassMetadata) -> Arc<ClassMetadata> {
        self.invalidate();
        self.classes.register(class)
    }

    /// Register a key mapper under the name used by `Mapify` annotations.
    pub fn register_mapper(&mut self, name: impl Into<String>, mapper: Arc<dyn Mapper>) {
        self.invalidate();
        self.mappers.register(name, mapper);
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    /// Resolve the translator for a type and annotation set.
    pub fn get(
        &self,
        ty: &TypeDesc,
        annotations: &Annotations,
        path: &Path,
    ) -> TranslateResult<Arc<dyn Translator>> {
        CreateContext::new(self).resolve(ty, annotations, path)
    }

    /// Build a root-level translator for every field of `class`.
    pub fn class_translator(
        &self,
        class: Arc<ClassMetadata>,
        path: &Path,
    ) -> TranslateResult<ClassTranslator> {
        ClassTranslator::create(class, &mut CreateContext::new(self), path)
    }

    /// Number of cached bindings.
    pub fn cached_count(&self) -> usize {
        self.cache
            .read()
            .expect("translator cache lock poisoned")
            .len()
    }

    fn invalidate(&mut self) {
        self.cache
            .get_mut()
            .expect("translator cache lock poisoned")
            .clear();
    }
}

impl std::fmt::Debug for Translators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translators")
            .field("factories", &self.factory_names())
            .field("classes", &self.classes.len())
            .field("cached", &self.cached_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FieldMetadata;
    use crate::translator::{LoadContext, SaveContext, Translated};
    use strata_types::{CollectionKind, Object, Value};

    fn registry() -> Translators {
        Translators::with_default_factories(MappingConfig::default())
    }

    // -----------------------------------------------------------------------
    // Chain order and caching
    // -----------------------------------------------------------------------

    #[test]
    fn default_chain_order() {
        assert_eq!(
            registry().factory_names(),
            vec!["mapify", "collection", "map", "embedded", "scalar", "any"]
        );
    }

    #[test]
    fn bindings_are_cached() {
        let translators = registry();
        let ty = TypeDesc::list_of(TypeDesc::Text);
        let a = translators.get(&ty, &Annotations::none(), &Path::root()).unwrap();
        let b = translators.get(&ty, &Annotations::none(), &Path::root()).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        // list binding + text element binding
        assert_eq!(translators.cached_count(), 2);
    }

    #[test]
    fn empty_chain_has_no_translator() {
        let translators = Translators::new(MappingConfig::default());
        let err = translators
            .get(&TypeDesc::Text, &Annotations::none(), &Path::root().extend("name"))
            .err()
            .unwrap();
        assert!(matches!(err, TranslateError::NoTranslator { .. }));
        assert!(err.to_string().starts_with("name:"));
    }

    // -----------------------------------------------------------------------
    // Custom factories
    // -----------------------------------------------------------------------

    struct Upper;

    impl Translator for Upper {
        fn load(
            &self,
            node: &Value,
            _existing: Option<&mut Object>,
            _ctx: &LoadContext<'_>,
            _path: &Path,
        ) -> TranslateResult<Translated<Object>> {
            match node {
                Value::Text(s) => Ok(Translated::Value(Object::Text(s.to_lowercase()))),
                _ => Ok(Translated::Skip),
            }
        }

        fn save(
            &self,
            object: &Object,
            _index: bool,
            _ctx: &SaveContext<'_>,
            _path: &Path,
        ) -> TranslateResult<Translated<Value>> {
            match object {
                Object::Text(s) => Ok(Translated::Value(Value::Text(s.to_uppercase()))),
                _ => Ok(Translated::Skip),
            }
        }
    }

    struct UpperFactory;

    impl TranslatorFactory for UpperFactory {
        fn name(&self) -> &str {
            "upper"
        }

        fn create(
            &self,
            ty: &TypeDesc,
            _annotations: &Annotations,
            _ctx: &mut CreateContext<'_>,
            _path: &Path,
        ) -> TranslateResult<Option<Arc<dyn Translator>>> {
            Ok((*ty == TypeDesc::Text).then(|| Arc::new(Upper) as Arc<dyn Translator>))
        }
    }

    #[test]
    fn inserted_factory_takes_priority() {
        let mut translators = registry();
        translators.insert_factory(0, Arc::new(UpperFactory));
        let list = translators
            .get(
                &TypeDesc::list_of(TypeDesc::Text),
                &Annotations::none(),
                &Path::root(),
            )
            .unwrap();
        let config = MappingConfig::default();
        let saved = list
            .save(
                &Object::Collection(strata_types::Collection::list(vec![Object::from("a")])),
                false,
                &SaveContext::new(&config),
                &Path::root(),
            )
            .unwrap();
        assert_eq!(
            saved,
            Translated::Value(Value::List(vec![Value::Text("A".into())]))
        );
    }

    // -----------------------------------------------------------------------
    // Cycles
    // -----------------------------------------------------------------------

    #[test]
    fn self_referential_class_is_rejected() {
        let mut translators = registry();
        translators.register_class(
            ClassMetadata::new("Node")
                .field(FieldMetadata::new("label", TypeDesc::Text))
                .field(FieldMetadata::new(
                    "children",
                    TypeDesc::collection(CollectionKind::List, TypeDesc::embedded("Node")),
                )),
        );
        let err = translators
            .get(&TypeDesc::embedded("Node"), &Annotations::none(), &Path::root())
            .err()
            .unwrap();
        assert!(matches!(err, TranslateError::CyclicType { .. }));
        assert!(err.to_string().contains("children"));
    }

    #[test]
    fn nesting_beyond_max_depth_is_rejected() {
        let config = MappingConfig {
            max_depth: 2,
            ..MappingConfig::default()
        };
        let translators = Translators::with_default_factories(config);
        let ty = TypeDesc::list_of(TypeDesc::list_of(TypeDesc::list_of(TypeDesc::Integer)));
        let err = translators
            .get(&ty, &Annotations::none(), &Path::root())
            .err()
            .unwrap();
        assert!(matches!(err, TranslateError::DepthExceeded { max: 2, .. }));
    }

    #[test]
    fn registering_a_class_clears_the_cache() {
        let mut translators = registry();
        translators
            .get(&TypeDesc::Text, &Annotations::none(), &Path::root())
            .unwrap();
        assert_eq!(translators.cached_count(), 1);
        translators.register_class(ClassMetadata::new("Empty"));
        assert_eq!(translators.cached_count(), 0);
    }
}
