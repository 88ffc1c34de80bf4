//! Comparator Engine storage.
//!
//! A comparator relates a value of `first` type to a value of `second` type.
//! Only the registered direction is stored; the opposite direction is served
//! by [`ReversedComparator`], which swaps the arguments and switches the
//! result. Resolution (exact match, then coercion) lives in
//! [`crate::resolution`].

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashSet;

use rulekit_core::{NativeType, RegistrationError, Relation, TypeHash, Value};

/// Relates two values.
pub trait Comparator: Send + Sync {
    /// Compare `first` to `second`. Never called with a missing operand.
    fn compare(&self, first: &Value, second: &Value) -> Relation;

    /// Whether ordering relations (greater, smaller, ...) are meaningful.
    ///
    /// Equality-only comparators keep the default.
    fn supports_ordering(&self) -> bool {
        false
    }
}

type CompareFn = dyn Fn(&Value, &Value) -> Relation + Send + Sync;

/// A closure-backed comparator.
pub struct FnComparator {
    function: Box<CompareFn>,
    ordering: bool,
}

impl FnComparator {
    /// An equality-only comparator.
    pub fn equality<F>(function: F) -> Self
    where
        F: Fn(&Value, &Value) -> Relation + Send + Sync + 'static,
    {
        Self {
            function: Box::new(function),
            ordering: false,
        }
    }

    /// A comparator that supports ordering relations.
    pub fn ordered<F>(function: F) -> Self
    where
        F: Fn(&Value, &Value) -> Relation + Send + Sync + 'static,
    {
        Self {
            function: Box::new(function),
            ordering: true,
        }
    }

    /// Wrap a comparison of two native types. Values whose payloads are not
    /// `A`/`B` compare as not equal.
    pub fn typed<A, B, F>(ordering: bool, function: F) -> Self
    where
        A: NativeType,
        B: NativeType,
        F: Fn(&A, &B) -> Relation + Send + Sync + 'static,
    {
        Self {
            function: Box::new(move |first, second| {
                match (first.downcast_ref::<A>(), second.downcast_ref::<B>()) {
                    (Some(a), Some(b)) => function(a, b),
                    _ => Relation::NotEqual,
                }
            }),
            ordering,
        }
    }
}

impl Comparator for FnComparator {
    fn compare(&self, first: &Value, second: &Value) -> Relation {
        (self.function)(first, second)
    }

    fn supports_ordering(&self) -> bool {
        self.ordering
    }
}

/// Serves a `(second, first)` view of a `(first, second)` comparator.
pub struct ReversedComparator {
    inner: Arc<dyn Comparator>,
}

impl ReversedComparator {
    pub fn new(inner: Arc<dyn Comparator>) -> Self {
        Self { inner }
    }
}

impl Comparator for ReversedComparator {
    fn compare(&self, first: &Value, second: &Value) -> Relation {
        self.inner.compare(second, first).switched()
    }

    fn supports_ordering(&self) -> bool {
        self.inner.supports_ordering()
    }
}

/// One registered comparator.
#[derive(Clone)]
pub struct ComparatorInfo {
    first: TypeHash,
    second: TypeHash,
    comparator: Arc<dyn Comparator>,
}

impl ComparatorInfo {
    pub fn new(first: TypeHash, second: TypeHash, comparator: impl Comparator + 'static) -> Self {
        Self {
            first,
            second,
            comparator: Arc::new(comparator),
        }
    }

    pub fn first(&self) -> TypeHash {
        self.first
    }

    pub fn second(&self) -> TypeHash {
        self.second
    }

    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    /// The comparator with its operands swapped.
    pub fn reversed(&self) -> ReversedComparator {
        ReversedComparator::new(Arc::clone(&self.comparator))
    }

    pub fn supports_ordering(&self) -> bool {
        self.comparator.supports_ordering()
    }
}

impl fmt::Debug for ComparatorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorInfo")
            .field("first", &self.first)
            .field("second", &self.second)
            .field("ordering", &self.comparator.supports_ordering())
            .finish()
    }
}

/// Registered comparators, in registration order.
#[derive(Debug, Default)]
pub struct ComparatorRegistry {
    entries: Vec<ComparatorInfo>,
    pairs: FxHashSet<(TypeHash, TypeHash)>,
}

impl ComparatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a comparator. The exact pair may be registered only once.
    pub fn register(
        &mut self,
        info: ComparatorInfo,
        name_of: impl Fn(TypeHash) -> String,
    ) -> Result<(), RegistrationError> {
        if !self.pairs.insert((info.first, info.second)) {
            return Err(RegistrationError::DuplicateComparator {
                first: name_of(info.first),
                second: name_of(info.second),
            });
        }
        self.entries.push(info);
        Ok(())
    }

    /// Check whether this exact pair has a comparator.
    pub fn contains(&self, first: TypeHash, second: TypeHash) -> bool {
        self.pairs.contains(&(first, second))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComparatorInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
