//! Entity persistence for strata.
//!
//! [`Factory`] holds entity and embedded class registrations and hands out
//! [`EntityMetadata`], which turns entity objects into backend records and
//! back. [`WriteEngine`] persists batches: it translates every entity up
//! front, issues one backend call per batch, and once the call completes
//! back-fills generated ids and keeps the [`Session`] consistent with what
//! was written or deleted.

pub mod entity;
pub mod error;
pub mod factory;
pub mod session;
pub mod write;

pub use entity::{EntityMetadata, IdKind, KeyMetadata};
pub use error::{EngineError, EngineResult};
pub use factory::Factory;
pub use session::{Session, SessionValue};
pub use write::{Saveable, SavedEntities, WriteEngine};
