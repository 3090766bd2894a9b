/// Errors from storage backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or rejected the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A record's key has an ancestor without an id.
    #[error("cannot store {0}: parent key is incomplete")]
    IncompleteParent(String),

    /// The task driving a deferred operation panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
