//! Storage backend contract for strata.
//!
//! A backend accepts whole batches of records and answers with a
//! [`Deferred`] handle as soon as the batch is dispatched. Nothing here
//! retries or reorders; `put` answers with one key per record, in order.
//!
//! [`InMemoryDatastore`] implements the contract over a map and is what the
//! tests and embedded users run against.

pub mod deferred;
pub mod error;
pub mod memory;
pub mod traits;

pub use deferred::Deferred;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryDatastore;
pub use traits::{AsyncDatastore, Transaction};
