use strata_types::Path;
use thiserror::Error;

/// Errors raised while creating or running translators.
///
/// Declining a value is not an error; see [`crate::Translated::Skip`].
#[derive(Debug, Error)]
pub enum TranslateError {
    /// No factory in the chain produced a translator for the type.
    #[error("{path}: no translator for {ty}")]
    NoTranslator { path: String, ty: String },

    /// The value or node did not have the shape the translator expects.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// The type refers back to itself.
    #[error("{path}: cyclic type {ty} is not supported")]
    CyclicType { path: String, ty: String },

    /// Translator creation nested deeper than the configured maximum.
    #[error("{path}: type nesting exceeds {max} levels")]
    DepthExceeded { path: String, max: usize },

    /// An embedded type names a class that was never registered.
    #[error("{path}: unregistered class {class:?}")]
    UnregisteredClass { path: String, class: String },

    /// A mapify annotation names a key mapper that was never registered.
    #[error("{path}: unknown key mapper {name:?}")]
    UnknownMapper { path: String, name: String },

    /// A key mapper could not derive a key from a loaded value.
    #[error("{path}: key mapper failed: {reason}")]
    Mapper { path: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl TranslateError {
    pub(crate) fn mismatch(path: &Path, expected: impl Into<String>, found: &str) -> Self {
        Self::TypeMismatch {
            path: path.to_string(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}

/// Result alias for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;
