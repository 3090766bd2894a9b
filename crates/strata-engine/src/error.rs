use thiserror::Error;

/// Errors raised by the entity layer and the write engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("translation error: {0}")]
    Translate(#[from] strata_translate::TranslateError),

    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    /// No entity was registered under the class name.
    #[error("unregistered entity class {0:?}")]
    UnregisteredClass(String),

    /// Only class instances and raw records can be saved.
    #[error("cannot save a {0} as an entity")]
    NotAnEntity(String),

    /// The entity or its key declaration is malformed.
    #[error("invalid entity {class}: {reason}")]
    InvalidEntity { class: String, reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
