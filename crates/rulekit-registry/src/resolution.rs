//! Comparator resolution.
//!
//! Given the statically declared operand types of "X relation Y" (or "X
//! between Y and Z"), find a comparator plus the converters that bring the
//! operands to its registered types. Strategies are tried in order and the
//! first match wins; within a strategy, comparators are scanned in
//! registration order.
//!
//! 1. [`ExactMatch`]: the operands are already assignable to a comparator's
//!    types, in either order.
//! 2. [`SingleSideCoercion`]: one operand fits, the other(s) are converted.
//! 3. [`DoubleSideCoercion`]: every operand is converted.
//!
//! A reversed match binds a [`ReversedComparator`](crate::ReversedComparator),
//! which swaps the arguments and switches the relation.

use std::fmt;
use std::sync::Arc;

use rulekit_core::{Relation, TypeHash, Value};

use crate::{
    Comparator, ComparatorInfo, ComparatorRegistry, ConverterFlags, ConverterRegistry,
    ResolvedConverter, TypeHierarchy,
};

/// Declared operand types of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComparisonQuery {
    pub first: TypeHash,
    pub second: TypeHash,
    /// Upper bound of a "between" comparison.
    pub third: Option<TypeHash>,
}

impl ComparisonQuery {
    pub fn binary(first: TypeHash, second: TypeHash) -> Self {
        Self {
            first,
            second,
            third: None,
        }
    }

    pub fn between(value: TypeHash, low: TypeHash, high: TypeHash) -> Self {
        Self {
            first: value,
            second: low,
            third: Some(high),
        }
    }
}

/// Which strategy produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStep {
    Exact,
    SingleSide,
    DoubleSide,
}

/// A comparator bound to a query, with operand converters.
#[derive(Clone)]
pub struct ResolvedComparison {
    /// Already oriented to the query's operand order.
    comparator: Arc<dyn Comparator>,
    reversed: bool,
    first: ResolvedConverter,
    second: ResolvedConverter,
    third: Option<ResolvedConverter>,
    step: ResolutionStep,
}

impl ResolvedComparison {
    pub fn step(&self) -> ResolutionStep {
        self.step
    }

    /// True when the operands match the comparator in swapped order.
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn supports_ordering(&self) -> bool {
        self.comparator.supports_ordering()
    }

    pub fn first_converter(&self) -> &ResolvedConverter {
        &self.first
    }

    pub fn second_converter(&self) -> &ResolvedConverter {
        &self.second
    }

    pub fn third_converter(&self) -> Option<&ResolvedConverter> {
        self.third.as_ref()
    }

    /// Relate two already converted operands, in query order.
    #[inline]
    pub fn relate(&self, first: &Value, second: &Value) -> Relation {
        self.comparator.compare(first, second)
    }

    /// Convert the operands and relate them.
    ///
    /// `None` when an operand has no conversion result at run time.
    pub fn compare(&self, hierarchy: &TypeHierarchy, first: &Value, second: &Value) -> Option<Relation> {
        let first = self.first.convert(hierarchy, first)?;
        let second = self.second.convert(hierarchy, second)?;
        Some(self.relate(&first, &second))
    }

    /// Like [`compare`](Self::compare), with `second` in the third operand's
    /// position (the upper bound of a "between").
    pub fn compare_third(
        &self,
        hierarchy: &TypeHierarchy,
        first: &Value,
        third: &Value,
    ) -> Option<Relation> {
        let converter = self.third.as_ref().unwrap_or(&self.second);
        let first = self.first.convert(hierarchy, first)?;
        let third = converter.convert(hierarchy, third)?;
        Some(self.relate(&first, &third))
    }
}

impl fmt::Debug for ResolvedComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedComparison")
            .field("step", &self.step)
            .field("reversed", &self.reversed)
            .field("first", &self.first.kind())
            .field("second", &self.second.kind())
            .field("third", &self.third.as_ref().map(ResolvedConverter::kind))
            .finish()
    }
}

/// Everything a strategy may consult.
#[derive(Clone, Copy)]
pub struct ResolutionContext<'a> {
    pub hierarchy: &'a TypeHierarchy,
    pub converters: &'a ConverterRegistry,
    pub comparators: &'a ComparatorRegistry,
}

impl ResolutionContext<'_> {
    fn convert(&self, from: TypeHash, to: TypeHash) -> Option<ResolvedConverter> {
        self.converters
            .resolve(self.hierarchy, from, to, ConverterFlags::empty())
    }

    /// Resolve converters for all operands, or `None` if any is missing.
    fn bind(
        &self,
        info: &ComparatorInfo,
        reversed: bool,
        query: &ComparisonQuery,
        step: ResolutionStep,
    ) -> Option<ResolvedComparison> {
        let (first_slot, second_slot) = if reversed {
            (info.second(), info.first())
        } else {
            (info.first(), info.second())
        };
        let first = self.convert(query.first, first_slot)?;
        let second = self.convert(query.second, second_slot)?;
        let third = match query.third {
            Some(third) => Some(self.convert(third, second_slot)?),
            None => None,
        };
        let comparator: Arc<dyn Comparator> = if reversed {
            Arc::new(info.reversed())
        } else {
            Arc::clone(info.comparator())
        };
        Some(ResolvedComparison {
            comparator,
            reversed,
            first,
            second,
            third,
            step,
        })
    }

    fn fits(&self, ty: TypeHash, slot: TypeHash) -> bool {
        self.hierarchy.is_assignable(ty, slot)
    }

    fn third_fits(&self, query: &ComparisonQuery, slot: TypeHash) -> bool {
        query.third.is_none_or(|third| self.fits(third, slot))
    }
}

/// One step of comparator resolution.
pub trait ResolutionStrategy: Send + Sync {
    fn step(&self) -> ResolutionStep;

    fn resolve(&self, ctx: &ResolutionContext<'_>, query: &ComparisonQuery)
    -> Option<ResolvedComparison>;
}

/// Step 1: operands assignable to a comparator's types, in either order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl ResolutionStrategy for ExactMatch {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::Exact
    }

    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        query: &ComparisonQuery,
    ) -> Option<ResolvedComparison> {
        ctx.comparators.iter().find_map(|info| {
            if ctx.fits(query.first, info.first())
                && ctx.fits(query.second, info.second())
                && ctx.third_fits(query, info.second())
            {
                ctx.bind(info, false, query, self.step())
            } else if ctx.fits(query.first, info.second())
                && ctx.fits(query.second, info.first())
                && ctx.third_fits(query, info.first())
            {
                ctx.bind(info, true, query, self.step())
            } else {
                None
            }
        })
    }
}

/// Step 2: one operand anchors a slot, the others are converted.
///
/// Per comparator: the first operand anchors the first slot, then the
/// second slot; then the second operand anchors the second slot, then the
/// first.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSideCoercion;

impl ResolutionStrategy for SingleSideCoercion {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::SingleSide
    }

    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        query: &ComparisonQuery,
    ) -> Option<ResolvedComparison> {
        ctx.comparators.iter().find_map(|info| {
            let attempts = [
                (ctx.fits(query.first, info.first()), false),
                (ctx.fits(query.first, info.second()), true),
                (ctx.fits(query.second, info.second()), false),
                (ctx.fits(query.second, info.first()), true),
            ];
            attempts
                .into_iter()
                .filter(|&(anchored, _)| anchored)
                .find_map(|(_, reversed)| ctx.bind(info, reversed, query, self.step()))
        })
    }
}

/// Step 3: every operand is converted, normal order first.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleSideCoercion;

impl ResolutionStrategy for DoubleSideCoercion {
    fn step(&self) -> ResolutionStep {
        ResolutionStep::DoubleSide
    }

    fn resolve(
        &self,
        ctx: &ResolutionContext<'_>,
        query: &ComparisonQuery,
    ) -> Option<ResolvedComparison> {
        ctx.comparators.iter().find_map(|info| {
            ctx.bind(info, false, query, self.step())
                .or_else(|| ctx.bind(info, true, query, self.step()))
        })
    }
}

/// The strategies in the order they are tried.
pub const STRATEGIES: &[&dyn ResolutionStrategy] =
    &[&ExactMatch, &SingleSideCoercion, &DoubleSideCoercion];

/// Run every strategy in order; first match wins.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve_comparison(
    ctx: &ResolutionContext<'_>,
    query: &ComparisonQuery,
) -> Option<ResolvedComparison> {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy.resolve(ctx, query))
}
