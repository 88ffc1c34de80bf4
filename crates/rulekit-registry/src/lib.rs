//! Type, converter and comparator registries.
//!
//! This crate provides the runtime type system that extensions populate
//! while they load:
//!
//! - [`TypeHierarchy`]: explicit supertype DAG used for all assignability checks
//! - [`TypeRegistry`]: descriptors with parsers, serializers, changers and arithmetic
//! - [`ConverterRegistry`]: converters with eagerly synthesized chains
//! - [`ComparatorRegistry`] and [`resolution`]: comparators and the
//!   strategies that bind them to operand types
//! - [`Registry`]: the facade used by everything else
//!
//! With the `defaults` feature (on by default), [`Registry::with_defaults`]
//! registers the built-in `object`, `integer`, `number`, `boolean` and
//! `text` types.

mod changer;
mod comparator;
mod converter;
#[cfg(feature = "defaults")]
mod defaults;
mod descriptor;
mod hierarchy;
mod registry;
pub mod resolution;
mod types;

pub use changer::{Changer, accepts_types, apply_change};
pub use comparator::{
    Comparator, ComparatorInfo, ComparatorRegistry, FnComparator, ReversedComparator,
};
pub use converter::{
    ConverterFlags, ConverterFn, ConverterInfo, ConverterKind, ConverterRegistry,
    ResolvedConverter,
};
pub use descriptor::{
    Arithmetic, ParseContext, Parser, Serializer, TypeDescriptor, is_valid_code_name,
};
pub use hierarchy::TypeHierarchy;
pub use registry::Registry;
pub use resolution::{ComparisonQuery, ResolutionStep, ResolvedComparison};
pub use types::TypeRegistry;
