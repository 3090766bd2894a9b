use std::fmt;

use serde::{Deserialize, Serialize};
use strata_types::{RawKey, Record};
use uuid::Uuid;

use crate::deferred::Deferred;

/// Opaque handle for a backend transaction.
///
/// Transaction semantics belong to the backend; this layer only passes the
/// handle through.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    id: Uuid,
}

impl Transaction {
    pub fn begin() -> Self {
        Self { id: Uuid::now_v7() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transaction({})", self.id)
    }
}

/// Asynchronous batch API of a record store.
///
/// All implementations must satisfy these invariants:
/// - Every call dispatches one batch request and returns immediately.
/// - `put` resolves to exactly one key per submitted record, in submission
///   order. Incomplete keys come back with an allocated numeric id; complete
///   keys come back unchanged.
/// - A batch either fully succeeds or fails as a unit.
/// - No internal retries.
pub trait AsyncDatastore: Send + Sync {
    /// Store a batch of records.
    fn put(&self, txn: Option<&Transaction>, records: Vec<Record>) -> Deferred<Vec<RawKey>>;

    /// Delete a batch of records. Deleting a missing key is not an error.
    fn delete(&self, txn: Option<&Transaction>, keys: Vec<RawKey>) -> Deferred<()>;

    /// Fetch a batch of records, `None` for keys that do not exist.
    fn get(&self, txn: Option<&Transaction>, keys: Vec<RawKey>) -> Deferred<Vec<Option<Record>>>;
}
