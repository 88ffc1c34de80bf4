//! NativeType trait for registrable Rust types.
//!
//! Every Rust type that travels through the registry inside a [`Value`]
//! implements [`NativeType`], which ties it to a [`TypeHash`] and a code name.
//!
//! # Example
//!
//! ```
//! use rulekit_core::{NativeType, TypeHash};
//!
//! struct Location {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl NativeType for Location {
//!     fn type_hash() -> TypeHash {
//!         TypeHash::from_name("location")
//!     }
//!
//!     fn type_name() -> &'static str {
//!         "location"
//!     }
//! }
//! ```
//!
//! [`Value`]: crate::Value

use crate::{TypeHash, builtins};

/// Trait for Rust types that can be stored in a [`Value`](crate::Value).
pub trait NativeType: Send + Sync + 'static {
    /// Get the type hash for this type.
    ///
    /// Must be consistent with the code name the type is registered under.
    fn type_hash() -> TypeHash;

    /// Get the code name of this type.
    fn type_name() -> &'static str;
}

impl NativeType for i64 {
    fn type_hash() -> TypeHash {
        builtins::INTEGER
    }

    fn type_name() -> &'static str {
        "integer"
    }
}

impl NativeType for f64 {
    fn type_hash() -> TypeHash {
        builtins::NUMBER
    }

    fn type_name() -> &'static str {
        "number"
    }
}

impl NativeType for bool {
    fn type_hash() -> TypeHash {
        builtins::BOOLEAN
    }

    fn type_name() -> &'static str {
        "boolean"
    }
}

impl NativeType for String {
    fn type_hash() -> TypeHash {
        builtins::TEXT
    }

    fn type_name() -> &'static str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_hashes_follow_names() {
        assert_eq!(i64::type_hash(), TypeHash::from_name(i64::type_name()));
        assert_eq!(f64::type_hash(), TypeHash::from_name(f64::type_name()));
        assert_eq!(bool::type_hash(), TypeHash::from_name(bool::type_name()));
        assert_eq!(String::type_hash(), TypeHash::from_name(String::type_name()));
    }
}
