//! The value source contract.
//!
//! An [`Expression`] is a lazily computed, context-bound, possibly
//! multi-valued source of values. Every retrieval starts from
//! [`Expression::compute`], a best-effort sequence in which elements that
//! could not be produced are `None`; retrieval always filters those out.
//!
//! The quantifier ([`Expression::get_and`]) decides how a plural source is
//! read: AND means "all values together", OR means "one of them", and a
//! single value is then picked uniformly at random.

use rand::Rng;

use rulekit_core::{AcceptedType, ChangeError, ChangeMode, TypeHash, Value};
use rulekit_registry::{Registry, accepts_types, apply_change};

use crate::EvalContext;

/// A value source.
pub trait Expression<E: ?Sized = ()> {
    /// Statically declared type of the produced values.
    fn return_type(&self) -> TypeHash;

    /// Whether at most one value is expected.
    fn is_single(&self) -> bool;

    /// Quantifier: `true` for AND, `false` for OR.
    fn get_and(&self) -> bool {
        true
    }

    /// Raw best-effort values; `None` marks an element that failed.
    fn compute(&self, ctx: &EvalContext<'_, E>) -> Vec<Option<Value>>;

    /// Every value currently producible.
    fn get_all(&self, ctx: &EvalContext<'_, E>) -> Vec<Value> {
        self.compute(ctx).into_iter().flatten().collect()
    }

    /// Values as the quantifier reads them: all of them under AND, one
    /// random value under OR.
    fn get_array(&self, ctx: &EvalContext<'_, E>) -> Vec<Value> {
        let mut all = self.get_all(ctx);
        if self.get_and() || all.len() <= 1 {
            return all;
        }
        let pick = rand::thread_rng().gen_range(0..all.len());
        vec![all.swap_remove(pick)]
    }

    /// One value, if any.
    fn get_single(&self, ctx: &EvalContext<'_, E>) -> Option<Value> {
        self.get_array(ctx).into_iter().next()
    }

    /// Apply `predicate` to the producible values under this expression's
    /// quantifier. `negated` flips only the final result; an empty source
    /// is always `false`.
    fn check(
        &self,
        ctx: &EvalContext<'_, E>,
        predicate: &mut dyn FnMut(&Value) -> bool,
        negated: bool,
    ) -> bool {
        check_values(&self.get_all(ctx), self.get_and(), predicate, negated)
    }

    /// Whether [`write_back`](Self::write_back) stores values.
    fn is_writable(&self) -> bool {
        false
    }

    /// Store the values a change produced, in the order
    /// [`get_all`](Self::get_all) returned them.
    fn write_back(&self, ctx: &EvalContext<'_, E>, _values: Vec<Value>) -> Result<(), ChangeError> {
        Err(ChangeError::ReadOnly {
            type_name: ctx.registry.type_name(self.return_type()),
        })
    }

    /// Accepted delta types for `mode`, or `None` if this source cannot be
    /// changed that way.
    ///
    /// Defaults to the changer of the return type's most specific
    /// descriptor; sources that cannot write back accept nothing.
    fn accept_change(&self, registry: &Registry, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        if !self.is_writable() {
            return None;
        }
        registry.accepted_changes(self.return_type(), mode)
    }

    /// Apply a change to the values of this source.
    ///
    /// Only valid for modes [`accept_change`](Self::accept_change) allowed.
    /// The default runs the type's changer over [`get_all`](Self::get_all)
    /// and hands the result to [`write_back`](Self::write_back).
    fn change(
        &self,
        ctx: &EvalContext<'_, E>,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError> {
        let type_name = ctx.registry.type_name(self.return_type());
        let Some(changer) = ctx.registry.changer_for(self.return_type()) else {
            tracing::error!(type_name = %type_name, %mode, "change invoked on a type without a changer");
            return Err(ChangeError::Unsupported { mode, type_name });
        };
        let mut values = self.get_all(ctx);
        apply_change(changer.as_ref(), &type_name, &mut values, delta, mode)?;
        self.write_back(ctx, values)
    }

    /// Human-readable description, used in error messages.
    fn to_display(&self, registry: &Registry) -> String;
}

/// Quantified predicate check over `values`.
///
/// Under AND the first failing value decides; under OR the first passing
/// one does. `negated` flips the result, except that an empty set is always
/// `false`.
pub fn check_values(
    values: &[Value],
    and: bool,
    predicate: &mut dyn FnMut(&Value) -> bool,
    negated: bool,
) -> bool {
    if values.is_empty() {
        return false;
    }
    for value in values {
        let passed = predicate(value);
        if and && !passed {
            return negated;
        }
        if !and && passed {
            return !negated;
        }
    }
    and ^ negated
}

/// Can `expr` be changed with `mode` using a delta of any of `candidates`?
pub fn accepts_change<E: ?Sized>(
    registry: &Registry,
    expr: &dyn Expression<E>,
    mode: ChangeMode,
    candidates: &[TypeHash],
) -> bool {
    expr.accept_change(registry, mode)
        .is_some_and(|accepted| accepts_types(registry.hierarchy(), &accepted, candidates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Literal;
    use rulekit_core::builtins;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::from).collect()
    }

    fn positive(value: &Value) -> bool {
        value.as_integer().is_some_and(|i| i > 0)
    }

    #[test]
    fn and_requires_every_value() {
        assert!(check_values(&ints(&[1, 2, 3]), true, &mut positive, false));
        assert!(!check_values(&ints(&[1, -2, 3]), true, &mut positive, false));
        assert!(check_values(&ints(&[1, -2, 3]), true, &mut positive, true));
    }

    #[test]
    fn or_requires_one_value() {
        assert!(check_values(&ints(&[-1, 2, -3]), false, &mut positive, false));
        assert!(!check_values(&ints(&[-1, -2]), false, &mut positive, false));
        assert!(check_values(&ints(&[-1, -2]), false, &mut positive, true));
    }

    #[test]
    fn empty_is_false_even_when_negated() {
        assert!(!check_values(&[], true, &mut positive, false));
        assert!(!check_values(&[], true, &mut positive, true));
        assert!(!check_values(&[], false, &mut positive, true));
    }

    #[test]
    fn and_stops_at_first_failure() {
        let mut seen = 0;
        let mut counting = |value: &Value| {
            seen += 1;
            positive(value)
        };
        check_values(&ints(&[1, -1, 2, 3]), true, &mut counting, false);
        assert_eq!(seen, 2);
    }

    #[test]
    fn or_list_reads_one_random_value() {
        let registry = Registry::with_defaults();
        let ctx = EvalContext::detached(&registry);
        let list: Box<dyn Expression> =
            Box::new(Literal::list(builtins::INTEGER, ints(&[1, 2, 3]), false));

        assert!(list.is_single());
        assert_eq!(list.get_all(&ctx).len(), 3);
        for _ in 0..16 {
            let picked = list.get_array(&ctx);
            assert_eq!(picked.len(), 1);
            assert!((1..=3).contains(&picked[0].as_integer().unwrap()));
        }
    }

    #[test]
    fn and_list_reads_everything() {
        let registry = Registry::with_defaults();
        let ctx = EvalContext::detached(&registry);
        let list: Box<dyn Expression> =
            Box::new(Literal::list(builtins::INTEGER, ints(&[1, 2, 3]), true));
        assert!(!list.is_single());
        assert_eq!(list.get_array(&ctx).len(), 3);
        assert_eq!(list.get_single(&ctx).unwrap().as_integer(), Some(1));
    }
}
