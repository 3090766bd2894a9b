use strata_types::{Object, Path, Value};

use crate::config::MappingConfig;
use crate::error::TranslateResult;

/// Outcome of a single translation step.
///
/// `Skip` is a control signal, not an error: the value contributes nothing
/// to its parent and the parent omits the corresponding property, element,
/// or field assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum Translated<T> {
    Value(T),
    Skip,
}

impl<T> Translated<T> {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            Self::Skip => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Translated<U> {
        match self {
            Self::Value(v) => Translated::Value(f(v)),
            Self::Skip => Translated::Skip,
        }
    }
}

/// State shared by every load call of one top-level load.
#[derive(Clone, Copy, Debug)]
pub struct LoadContext<'a> {
    config: &'a MappingConfig,
}

impl<'a> LoadContext<'a> {
    pub fn new(config: &'a MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        self.config
    }
}

/// State shared by every save call of one top-level save.
#[derive(Clone, Copy, Debug)]
pub struct SaveContext<'a> {
    config: &'a MappingConfig,
}

impl<'a> SaveContext<'a> {
    pub fn new(config: &'a MappingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MappingConfig {
        self.config
    }
}

/// Bidirectional codec between one typed value and its record node.
///
/// Translators are created once per `(type, annotations)` binding and
/// reused; they hold no per-call state.
pub trait Translator: Send + Sync {
    /// Convert a record node into a value.
    ///
    /// `existing` is the value currently held by the target field, if any.
    /// A translator may update it in place and return [`Translated::Skip`]
    /// so the parent does not reassign the field. A null or empty node
    /// returns `Skip` and leaves `existing` untouched.
    fn load(
        &self,
        node: &Value,
        existing: Option<&mut Object>,
        ctx: &LoadContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Object>>;

    /// Convert a value into a record node without modifying it.
    ///
    /// Returns `Skip` when the value is semantically absent (null, or an
    /// empty container).
    fn save(
        &self,
        object: &Object,
        index: bool,
        ctx: &SaveContext<'_>,
        path: &Path,
    ) -> TranslateResult<Translated<Value>>;
}
