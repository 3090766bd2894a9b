use std::collections::HashMap;
use std::sync::Arc;

use strata_types::{Object, Path};

use crate::error::{TranslateError, TranslateResult};

/// Key-extraction strategy for mapified fields.
///
/// The mapper sees the fully loaded element value, so it can read any
/// hydrated field of it.
pub trait Mapper: Send + Sync {
    fn key_of(&self, value: &Object, path: &Path) -> TranslateResult<Object>;
}

impl<F> Mapper for F
where
    F: Fn(&Object, &Path) -> TranslateResult<Object> + Send + Sync,
{
    fn key_of(&self, value: &Object, path: &Path) -> TranslateResult<Object> {
        self(value, path)
    }
}

/// Uses one named field of the loaded instance as the key.
#[derive(Clone, Debug)]
pub struct FieldMapper {
    field: String,
}

impl FieldMapper {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Mapper for FieldMapper {
    fn key_of(&self, value: &Object, path: &Path) -> TranslateResult<Object> {
        let instance = value
            .as_instance()
            .ok_or_else(|| TranslateError::Mapper {
                path: path.to_string(),
                reason: format!("expected an instance, found {}", value.type_name()),
            })?;
        instance
            .get(&self.field)
            .cloned()
            .ok_or_else(|| TranslateError::Mapper {
                path: path.to_string(),
                reason: format!("{} has no field {:?}", instance.class(), self.field),
            })
    }
}

/// Registered key mappers by name.
#[derive(Default)]
pub struct Mappers {
    by_name: HashMap<String, Arc<dyn Mapper>>,
}

impl Mappers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, mapper: Arc<dyn Mapper>) {
        self.by_name.insert(name.into(), mapper);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Mapper>> {
        self.by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl std::fmt::Debug for Mappers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Mappers").field("names", &names).finish()
    }
}
