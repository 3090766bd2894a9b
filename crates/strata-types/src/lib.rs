//! Foundation types for strata.
//!
//! This crate provides the two halves every other strata crate translates
//! between: the dynamic in-memory object model and the flat record model the
//! storage backend understands. Every other strata crate depends on
//! `strata-types`.
//!
//! # Key Types
//!
//! - [`RawKey`]: Backend identifier (kind, optional parent, id or name)
//! - [`Key`]: Logical key wrapping a resolved or unresolved [`RawKey`]
//! - [`Record`]: Flat, named bag of [`Property`] values
//! - [`Value`]: A single record node: scalar, list of nodes, or embedded map
//! - [`Object`]: In-memory value: scalar, [`Collection`], [`ObjectMap`], or [`Instance`]
//! - [`Path`]: Immutable field/position chain used for error attribution

pub mod error;
pub mod key;
pub mod object;
pub mod path;
pub mod record;
pub mod value;

pub use error::TypeError;
pub use key::{Key, KeyId, RawKey};
pub use object::{Collection, CollectionKind, Instance, MapKind, Object, ObjectMap, SortOrder};
pub use path::Path;
pub use record::Record;
pub use value::{Property, PropertyMap, Value};
