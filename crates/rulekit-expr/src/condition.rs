//! Comparison conditions: `X is [not] <relation> Y` and
//! `X is [not] between Y and Z`.
//!
//! The comparator is resolved once, when the condition is built, from the
//! operands' declared types. Operands declared as `object` defer the lookup
//! to evaluation, where each pair of runtime values is compared through the
//! registry and an unresolvable pair counts as not equal.

use rulekit_core::{Relation, ResolutionError, Value, builtins};
use rulekit_registry::{ComparisonQuery, Registry, ResolvedComparison};

use crate::{EvalContext, Expression, check_values};

/// A comparison between two (or, for "between", three) expressions.
pub struct Comparison<E: ?Sized = ()> {
    first: Box<dyn Expression<E>>,
    second: Box<dyn Expression<E>>,
    third: Option<Box<dyn Expression<E>>>,
    relation: Relation,
    negated: bool,
    resolved: Option<ResolvedComparison>,
}

impl<E: ?Sized> Comparison<E> {
    /// `first relation second`.
    pub fn new(
        registry: &Registry,
        first: Box<dyn Expression<E>>,
        relation: Relation,
        second: Box<dyn Expression<E>>,
    ) -> Result<Self, ResolutionError> {
        let query = ComparisonQuery::binary(first.return_type(), second.return_type());
        let resolved = Self::resolve(registry, &query, relation)?;
        Ok(Self {
            first,
            second,
            third: None,
            relation,
            negated: false,
            resolved,
        })
    }

    /// `value is [not] between low and high`, bounds inclusive.
    pub fn between(
        registry: &Registry,
        value: Box<dyn Expression<E>>,
        low: Box<dyn Expression<E>>,
        high: Box<dyn Expression<E>>,
        negated: bool,
    ) -> Result<Self, ResolutionError> {
        let query = ComparisonQuery::between(
            value.return_type(),
            low.return_type(),
            high.return_type(),
        );
        let resolved = Self::resolve(registry, &query, Relation::GreaterOrEqual)?;
        Ok(Self {
            first: value,
            second: low,
            third: Some(high),
            relation: Relation::GreaterOrEqual,
            negated,
            resolved,
        })
    }

    /// Negate the condition.
    pub fn negated(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    pub fn relation(&self) -> Relation {
        self.relation
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_between(&self) -> bool {
        self.third.is_some()
    }

    /// The comparator chosen when the condition was built; `None` if the
    /// lookup was deferred to evaluation.
    pub fn resolved(&self) -> Option<&ResolvedComparison> {
        self.resolved.as_ref()
    }

    fn resolve(
        registry: &Registry,
        query: &ComparisonQuery,
        relation: Relation,
    ) -> Result<Option<ResolvedComparison>, ResolutionError> {
        let deferred = query.first == builtins::OBJECT
            || query.second == builtins::OBJECT
            || query.third == Some(builtins::OBJECT);
        if deferred {
            tracing::debug!("operand declared as object; comparator lookup deferred");
            return Ok(None);
        }

        let resolved = registry.resolve_comparison(query)?;
        if relation.is_ordering() && !resolved.supports_ordering() {
            return Err(ResolutionError::UnsupportedRelation {
                relation,
                first: registry.type_name(query.first),
                second: registry.type_name(query.second),
            });
        }
        Ok(Some(resolved))
    }

    fn relate(&self, registry: &Registry, first: &Value, second: &Value) -> Relation {
        match &self.resolved {
            Some(resolved) => resolved.relate(first, second),
            None => registry.compare(first, second).unwrap_or(Relation::NotEqual),
        }
    }

    /// Evaluate the condition.
    ///
    /// Each operand is read under its own quantifier: `all of X > any of Y`
    /// requires every X to exceed at least one Y. An empty first operand
    /// makes the condition false, negated or not. An empty second or third
    /// operand fails the inner check for every first value, so the condition
    /// is false, and true when negated.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check(&self, ctx: &EvalContext<'_, E>) -> bool {
        let registry = ctx.registry;
        let hierarchy = registry.hierarchy();
        let operand = |expr: &dyn Expression<E>, slot: usize| -> Vec<Value> {
            let values = expr.get_all(ctx);
            let Some(resolved) = &self.resolved else {
                return values;
            };
            let converter = match slot {
                0 => resolved.first_converter(),
                1 => resolved.second_converter(),
                _ => resolved.third_converter().unwrap_or(resolved.second_converter()),
            };
            converter.convert_all(hierarchy, &values)
        };

        let firsts = operand(self.first.as_ref(), 0);
        let seconds = operand(self.second.as_ref(), 1);
        let second_and = self.second.get_and();

        match &self.third {
            None => check_values(
                &firsts,
                self.first.get_and(),
                &mut |a: &Value| {
                    check_values(
                        &seconds,
                        second_and,
                        &mut |b: &Value| self.relation.is(self.relate(registry, a, b)),
                        false,
                    )
                },
                self.negated,
            ),
            Some(third) => {
                let thirds = operand(third.as_ref(), 2);
                let third_and = third.get_and();
                check_values(
                    &firsts,
                    self.first.get_and(),
                    &mut |x: &Value| {
                        let above = check_values(
                            &seconds,
                            second_and,
                            &mut |low: &Value| Relation::GreaterOrEqual.is(self.relate(registry, x, low)),
                            false,
                        );
                        above
                            && check_values(
                                &thirds,
                                third_and,
                                &mut |high: &Value| {
                                    Relation::SmallerOrEqual.is(self.relate(registry, x, high))
                                },
                                false,
                            )
                    },
                    self.negated,
                )
            }
        }
    }

    pub fn to_display(&self, registry: &Registry) -> String {
        let not = if self.negated { "not " } else { "" };
        match &self.third {
            None => format!(
                "{} is {}{} {}",
                self.first.to_display(registry),
                not,
                self.relation.phrase(),
                self.second.to_display(registry)
            ),
            Some(third) => format!(
                "{} is {}between {} and {}",
                self.first.to_display(registry),
                not,
                self.second.to_display(registry),
                third.to_display(registry)
            ),
        }
    }
}
