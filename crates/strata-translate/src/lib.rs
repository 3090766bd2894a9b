//! Recursive translator framework for strata.
//!
//! A [`Translator`] converts one typed value to a record node and back.
//! Translators are produced by an ordered chain of [`TranslatorFactory`]
//! links held by the [`Translators`] registry: each factory inspects the
//! requested [`TypeDesc`] and [`Annotations`] and either declines or builds a
//! translator. Container factories resolve their element translators through
//! the same registry, so translators compose recursively.
//!
//! # Skip
//!
//! A translator that has nothing to contribute returns
//! [`Translated::Skip`]. Parents omit skipped elements, properties, and
//! field assignments. Skip is never an error and never logged; anything
//! returned as `Err` aborts the whole translation.
//!
//! # Default chain
//!
//! 1. [`MapifyTranslatorFactory`]: annotated maps stored as a value list
//! 2. [`CollectionTranslatorFactory`]: lists and sets
//! 3. [`MapTranslatorFactory`]: text-keyed maps stored as embedded maps
//! 4. [`EmbeddedTranslatorFactory`]: registered classes
//! 5. [`ScalarTranslatorFactory`]: bool, integer, float, text, bytes, key
//! 6. [`AnyTranslatorFactory`]: unconstrained values

pub mod config;
pub mod error;
pub mod factories;
pub mod mapper;
pub mod metadata;
pub mod registry;
pub mod translator;
pub mod types;

pub use config::MappingConfig;
pub use error::{TranslateError, TranslateResult};
pub use factories::{
    AnyTranslatorFactory, ClassTranslator, CollectionTranslatorFactory, EmbeddedTranslatorFactory,
    MapTranslatorFactory, MapifyTranslatorFactory, ScalarTranslatorFactory,
};
pub use mapper::{FieldMapper, Mapper, Mappers};
pub use metadata::{ClassMetadata, ClassRegistry, FieldMetadata};
pub use registry::{CreateContext, TranslatorFactory, Translators};
pub use translator::{LoadContext, SaveContext, Translated, Translator};
pub use types::{Annotation, Annotations, TypeDesc};
