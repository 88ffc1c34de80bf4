//! Core types for the rulekit runtime type registry.
//!
//! This crate holds the vocabulary shared by the registry and the expression
//! layer:
//!
//! - [`TypeHash`]: stable identity of a registered type
//! - [`NativeType`] and [`Value`]: Rust types and the dynamic values built from them
//! - [`Relation`]: the result of a comparison
//! - [`ChangeMode`] and [`AcceptedType`]: mutation intents and their deltas
//! - [`Fields`]: the persisted representation of a value
//! - Error types for each phase

mod change_mode;
mod error;
mod fields;
mod native;
mod relation;
mod type_hash;
mod value;

pub use change_mode::{AcceptedType, ChangeMode};
pub use error::{ChangeError, FieldsError, RegistrationError, ResolutionError, RulekitError};
pub use fields::{FieldValue, Fields};
pub use native::NativeType;
pub use relation::Relation;
pub use type_hash::{TypeHash, builtins, hash_constants};
pub use value::Value;
