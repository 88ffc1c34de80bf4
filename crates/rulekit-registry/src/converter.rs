//! Converter Engine.
//!
//! Converters are one-way, possibly failing functions between two types.
//! They form a directed graph; whenever a converter is registered, every
//! composition with already registered converters that the chaining flags
//! permit is synthesized immediately, so a lookup never has to search.
//!
//! ## Lookup Tiers
//!
//! For a declared source type `F` and a target `T`:
//! 1. Identity, when `F` is assignable to `T`
//! 2. The exact `(F, T)` entry
//! 3. An entry whose input accepts `F` and whose output is assignable to `T`
//! 4. An entry where either the input or the output must be re-checked
//!    against the runtime value
//! 5. An entry where both must be re-checked
//!
//! Re-checked converters yield `None` on a type mismatch instead of failing,
//! because callers often only know a statically too general type.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;

use rulekit_core::{RegistrationError, TypeHash, Value};

use crate::TypeHierarchy;

bitflags! {
    /// Chaining and usage restrictions of a converter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ConverterFlags: u8 {
        /// The converter may not be the second hop of a chain.
        const NO_LEFT_CHAINING = 0b0001;
        /// The converter may not be the first hop of a chain.
        const NO_RIGHT_CHAINING = 0b0010;
        /// The converter may not be chained at all.
        const NO_CHAINING = Self::NO_LEFT_CHAINING.bits() | Self::NO_RIGHT_CHAINING.bits();
        /// The converter is not used to parse command arguments.
        const NO_COMMAND_ARGUMENTS = 0b0100;
    }
}

/// A converter function. `None` means "no result" for this input.
pub type ConverterFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// One registered (explicit or chained) converter.
#[derive(Clone)]
pub struct ConverterInfo {
    from: TypeHash,
    to: TypeHash,
    function: ConverterFn,
    flags: ConverterFlags,
    /// Number of explicit converters composed into this one.
    hops: u32,
}

impl ConverterInfo {
    /// Create an explicit converter.
    pub fn new<F>(from: TypeHash, to: TypeHash, flags: ConverterFlags, function: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            from,
            to,
            function: Arc::new(function),
            flags,
            hops: 1,
        }
    }

    /// Compose `first` then `second`. Short-circuits on the first `None`.
    fn chain(first: &ConverterInfo, second: &ConverterInfo) -> Self {
        let f = Arc::clone(&first.function);
        let g = Arc::clone(&second.function);
        let flags = (first.flags & ConverterFlags::NO_LEFT_CHAINING)
            | (second.flags & ConverterFlags::NO_RIGHT_CHAINING)
            | ((first.flags | second.flags) & ConverterFlags::NO_COMMAND_ARGUMENTS);
        Self {
            from: first.from,
            to: second.to,
            function: Arc::new(move |value| f(value).and_then(|mid| g(&mid))),
            flags,
            hops: first.hops + second.hops,
        }
    }

    pub fn from(&self) -> TypeHash {
        self.from
    }

    pub fn to(&self) -> TypeHash {
        self.to
    }

    pub fn flags(&self) -> ConverterFlags {
        self.flags
    }

    /// True for converters synthesized from two or more explicit ones.
    pub fn is_chained(&self) -> bool {
        self.hops > 1
    }

    pub fn hops(&self) -> u32 {
        self.hops
    }

    /// Run the function without any type checks.
    #[inline]
    pub fn call(&self, value: &Value) -> Option<Value> {
        (self.function)(value)
    }
}

impl fmt::Debug for ConverterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterInfo")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("flags", &self.flags)
            .field("hops", &self.hops)
            .finish()
    }
}

// ============================================================================
// Resolved converters
// ============================================================================

/// How a resolved converter is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConverterKind {
    /// The source is already assignable to the target.
    Identity,
    /// The converter is applied as is.
    Direct,
    /// The runtime input and/or output type is re-checked.
    Checked { input: bool, output: bool },
}

/// Result of a converter lookup, detached from the registry.
#[derive(Debug, Clone)]
pub struct ResolvedConverter {
    target: TypeHash,
    kind: ConverterKind,
    info: Option<ConverterInfo>,
}

impl ResolvedConverter {
    fn identity(target: TypeHash) -> Self {
        Self {
            target,
            kind: ConverterKind::Identity,
            info: None,
        }
    }

    fn with(info: &ConverterInfo, target: TypeHash, kind: ConverterKind) -> Self {
        Self {
            target,
            kind,
            info: Some(info.clone()),
        }
    }

    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    pub fn target(&self) -> TypeHash {
        self.target
    }

    /// The underlying converter, `None` for identity.
    pub fn info(&self) -> Option<&ConverterInfo> {
        self.info.as_ref()
    }

    /// Convert one value. `None` if the converter yields no result or a
    /// re-checked type does not match.
    pub fn convert(&self, hierarchy: &TypeHierarchy, value: &Value) -> Option<Value> {
        let Some(info) = &self.info else {
            return Some(value.clone());
        };
        let (check_input, check_output) = match self.kind {
            ConverterKind::Checked { input, output } => (input, output),
            _ => (false, false),
        };
        if check_input && !hierarchy.is_assignable(value.type_hash(), info.from) {
            return None;
        }
        let converted = info.call(value)?;
        if check_output && !hierarchy.is_assignable(converted.type_hash(), self.target) {
            return None;
        }
        Some(converted)
    }

    /// Convert every value, dropping those without a result. Order is kept.
    pub fn convert_all(&self, hierarchy: &TypeHierarchy, values: &[Value]) -> Vec<Value> {
        values
            .iter()
            .filter_map(|value| {
                let converted = self.convert(hierarchy, value);
                if converted.is_none() {
                    tracing::trace!(?value, to = %self.target, "conversion dropped element");
                }
                converted
            })
            .collect()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// All explicit and chained converters, with an exact-pair index.
#[derive(Debug, Default)]
pub struct ConverterRegistry {
    entries: Vec<ConverterInfo>,
    exact: FxHashMap<(TypeHash, TypeHash), usize>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explicit converter and synthesize all chains through it.
    ///
    /// An explicit converter may replace a chained one for the same pair.
    /// Returns the number of chained converters synthesized.
    pub fn register(
        &mut self,
        hierarchy: &TypeHierarchy,
        info: ConverterInfo,
        name_of: impl Fn(TypeHash) -> String,
    ) -> Result<usize, RegistrationError> {
        if info.from == info.to {
            return Err(RegistrationError::IdentityConverter(name_of(info.from)));
        }

        let key = (info.from, info.to);
        let index = match self.exact.get(&key) {
            Some(&i) if !self.entries[i].is_chained() => {
                return Err(RegistrationError::DuplicateConverter {
                    from: name_of(info.from),
                    to: name_of(info.to),
                });
            }
            Some(&i) => {
                self.entries[i] = info;
                i
            }
            None => self.push(info),
        };

        Ok(self.synthesize_chains(hierarchy, index))
    }

    fn push(&mut self, info: ConverterInfo) -> usize {
        let index = self.entries.len();
        self.exact.insert((info.from, info.to), index);
        self.entries.push(info);
        index
    }

    fn can_chain(
        &self,
        hierarchy: &TypeHierarchy,
        first: &ConverterInfo,
        second: &ConverterInfo,
    ) -> bool {
        !first.flags.contains(ConverterFlags::NO_RIGHT_CHAINING)
            && !second.flags.contains(ConverterFlags::NO_LEFT_CHAINING)
            && first.from != second.to
            && hierarchy.is_assignable(first.to, second.from)
            && !self.exact.contains_key(&(first.from, second.to))
    }

    /// Chain `start` with every compatible entry until a fixpoint.
    fn synthesize_chains(&mut self, hierarchy: &TypeHierarchy, start: usize) -> usize {
        let mut created = 0;
        let mut pending = vec![start];

        while let Some(current) = pending.pop() {
            let mut other = 0;
            while other < self.entries.len() {
                let new = self.entries[current].clone();
                let existing = self.entries[other].clone();
                other += 1;

                for (first, second) in [(&existing, &new), (&new, &existing)] {
                    if self.can_chain(hierarchy, first, second) {
                        let chained = ConverterInfo::chain(first, second);
                        tracing::trace!(
                            from = %chained.from,
                            to = %chained.to,
                            hops = chained.hops,
                            "synthesized chained converter"
                        );
                        pending.push(self.push(chained));
                        created += 1;
                    }
                }
            }
        }

        created
    }

    /// Get the converter registered for exactly this pair.
    pub fn get_exact(&self, from: TypeHash, to: TypeHash) -> Option<&ConverterInfo> {
        self.exact.get(&(from, to)).map(|&i| &self.entries[i])
    }

    /// Find a converter from `from` to `to`, ignoring entries that carry any
    /// of `exclude`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve(
        &self,
        hierarchy: &TypeHierarchy,
        from: TypeHash,
        to: TypeHash,
        exclude: ConverterFlags,
    ) -> Option<ResolvedConverter> {
        if hierarchy.is_assignable(from, to) {
            return Some(ResolvedConverter::identity(to));
        }

        let usable = |info: &&ConverterInfo| !info.flags.intersects(exclude);

        if let Some(info) = self.get_exact(from, to).filter(usable) {
            return Some(ResolvedConverter::with(info, to, ConverterKind::Direct));
        }

        let candidates = || self.entries.iter().filter(usable);

        // Input accepts the declared type, output is guaranteed.
        if let Some(info) = candidates().find(|info| {
            hierarchy.is_assignable(from, info.from) && hierarchy.is_assignable(info.to, to)
        }) {
            return Some(ResolvedConverter::with(info, to, ConverterKind::Direct));
        }

        // One side must be re-checked at run time.
        for info in candidates() {
            if hierarchy.is_assignable(from, info.from) && hierarchy.is_assignable(to, info.to) {
                let kind = ConverterKind::Checked {
                    input: false,
                    output: true,
                };
                return Some(ResolvedConverter::with(info, to, kind));
            }
            if hierarchy.is_assignable(info.from, from) && hierarchy.is_assignable(info.to, to) {
                let kind = ConverterKind::Checked {
                    input: true,
                    output: false,
                };
                return Some(ResolvedConverter::with(info, to, kind));
            }
        }

        // Both sides must be re-checked.
        candidates()
            .find(|info| {
                hierarchy.is_assignable(info.from, from) && hierarchy.is_assignable(to, info.to)
            })
            .map(|info| {
                let kind = ConverterKind::Checked {
                    input: true,
                    output: true,
                };
                ResolvedConverter::with(info, to, kind)
            })
    }

    /// Check whether any converter (or identity) leads from `from` to `to`.
    pub fn can_convert(&self, hierarchy: &TypeHierarchy, from: TypeHash, to: TypeHash) -> bool {
        self.resolve(hierarchy, from, to, ConverterFlags::empty())
            .is_some()
    }

    /// All entries, explicit and chained, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ConverterInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
