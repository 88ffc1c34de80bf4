//! Type-tagged dynamic value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::{NativeType, TypeHash};

/// A dynamic value flowing through conversions, comparisons and changers.
///
/// The payload is shared (`Arc`), so cloning a value is cheap and never
/// clones the underlying Rust object. The runtime [`TypeHash`] is the value's
/// most specific type, which may be a subtype of whatever an expression
/// declared statically.
#[derive(Clone)]
pub struct Value {
    type_hash: TypeHash,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Value {
    /// Wrap a native value, tagging it with its own type hash.
    pub fn new<T: NativeType>(value: T) -> Self {
        Self {
            type_hash: T::type_hash(),
            inner: Arc::new(value),
        }
    }

    /// Wrap a native value under an explicit runtime type.
    ///
    /// Used when one Rust type backs several registered types, e.g. a generic
    /// entity struct tagged as `player` or `zombie`.
    pub fn with_type<T: Any + Send + Sync>(type_hash: TypeHash, value: T) -> Self {
        Self {
            type_hash,
            inner: Arc::new(value),
        }
    }

    /// Runtime type of this value.
    #[inline]
    pub fn type_hash(&self) -> TypeHash {
        self.type_hash
    }

    /// Borrow the payload as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Check whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Check whether two values share the same payload allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Shorthand for `downcast_ref::<i64>().copied()`.
    pub fn as_integer(&self) -> Option<i64> {
        self.downcast_ref::<i64>().copied()
    }

    /// Shorthand for `downcast_ref::<f64>().copied()`.
    pub fn as_number(&self) -> Option<f64> {
        self.downcast_ref::<f64>().copied()
    }

    /// Shorthand for `downcast_ref::<bool>().copied()`.
    pub fn as_boolean(&self) -> Option<bool> {
        self.downcast_ref::<bool>().copied()
    }

    /// Shorthand for `downcast_ref::<String>().map(String::as_str)`.
    pub fn as_text(&self) -> Option<&str> {
        self.downcast_ref::<String>().map(String::as_str)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.as_integer() {
            write!(f, "Integer({})", v)
        } else if let Some(v) = self.as_number() {
            write!(f, "Number({})", v)
        } else if let Some(v) = self.as_boolean() {
            write!(f, "Boolean({})", v)
        } else if let Some(v) = self.as_text() {
            write!(f, "Text({:?})", v)
        } else {
            write!(f, "Value({:?})", self.type_hash)
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::new(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::new(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::new(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::new(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(value.to_string())
    }
}
