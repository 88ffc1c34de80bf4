//! Deterministic hash-based type identity.
//!
//! This module provides [`TypeHash`], a 64-bit hash that identifies a
//! registered type by its code name. Hashes are computed deterministically,
//! which gives us:
//!
//! - Forward references (a converter can name a type before it is registered)
//! - No registration order dependencies between extensions
//! - Same code name = same identity, regardless of which extension asks
//!
//! # Hash Computation
//!
//! Uses XXHash64 mixed with a domain constant. The computation is `const`, so
//! well-known hashes (see [`builtins`]) are plain constants.
//!
//! # Examples
//!
//! ```
//! use rulekit_core::TypeHash;
//!
//! let integer = TypeHash::from_name("integer");
//! assert_eq!(integer, TypeHash::from_name("integer"));
//! assert_ne!(integer, TypeHash::from_name("number"));
//! ```

use std::fmt;

use xxhash_rust::const_xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;
}

/// A deterministic 64-bit hash identifying a registered type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Create a type hash from a type's code name.
    ///
    /// The same name always produces the same hash.
    ///
    /// ```
    /// use rulekit_core::TypeHash;
    ///
    /// const PLAYER: TypeHash = TypeHash::from_name("player");
    /// assert_eq!(PLAYER, TypeHash::from_name("player"));
    /// ```
    #[inline]
    pub const fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Check if this is an empty/invalid hash.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the underlying u64 value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Well-known hashes for the built-in types.
///
/// `OBJECT` is the universal supertype: every type is assignable to it, and an
/// expression declared as `OBJECT` may produce values of any runtime type.
pub mod builtins {
    use super::TypeHash;

    /// Hash for `object`, the universal supertype.
    pub const OBJECT: TypeHash = TypeHash::from_name("object");

    /// Hash for `integer` (backed by `i64`).
    pub const INTEGER: TypeHash = TypeHash::from_name("integer");

    /// Hash for `number` (backed by `f64`).
    pub const NUMBER: TypeHash = TypeHash::from_name("number");

    /// Hash for `boolean` (backed by `bool`).
    pub const BOOLEAN: TypeHash = TypeHash::from_name("boolean");

    /// Hash for `text` (backed by `String`).
    pub const TEXT: TypeHash = TypeHash::from_name("text");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_hash_determinism() {
        let hash1 = TypeHash::from_name("integer");
        let hash2 = TypeHash::from_name("integer");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn type_hash_uniqueness() {
        let names = ["object", "integer", "number", "boolean", "text", "player"];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(TypeHash::from_name(a), TypeHash::from_name(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn builtin_constants_match_runtime_hashes() {
        assert_eq!(builtins::OBJECT, TypeHash::from_name("object"));
        assert_eq!(builtins::TEXT, TypeHash::from_name("text"));
    }

    #[test]
    fn empty_hash() {
        assert!(TypeHash::EMPTY.is_empty());
        assert!(!builtins::INTEGER.is_empty());
    }

    #[test]
    fn display_is_hex() {
        let hash = TypeHash(0x1234);
        assert_eq!(hash.to_string(), "0x0000000000001234");
        assert_eq!(format!("{hash:?}"), "TypeHash(0x0000000000001234)");
    }
}
