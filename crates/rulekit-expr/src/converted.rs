//! Adapting a source to a required type.

use rulekit_core::{AcceptedType, ChangeError, ChangeMode, ResolutionError, TypeHash, Value};
use rulekit_registry::{Registry, ResolvedConverter};

use crate::{EvalContext, Expression};

/// Wraps a source and converts its values to another type.
///
/// Conversion is best-effort: values without a conversion result are
/// dropped. Changes are forwarded to the source unchanged.
pub struct ConvertedExpression<E: ?Sized = ()> {
    source: Box<dyn Expression<E>>,
    converter: ResolvedConverter,
}

impl<E: ?Sized> ConvertedExpression<E> {
    /// Fails if no converter leads from the source's type to `to`.
    pub fn new(
        registry: &Registry,
        source: Box<dyn Expression<E>>,
        to: TypeHash,
    ) -> Result<Self, ResolutionError> {
        let from = source.return_type();
        let converter = registry
            .converter(from, to)
            .ok_or_else(|| ResolutionError::NoConverter {
                from: registry.type_name(from),
                to: registry.type_name(to),
            })?;
        Ok(Self { source, converter })
    }

    pub fn source(&self) -> &dyn Expression<E> {
        self.source.as_ref()
    }

    pub fn converter(&self) -> &ResolvedConverter {
        &self.converter
    }
}

impl<E: ?Sized> Expression<E> for ConvertedExpression<E> {
    fn return_type(&self) -> TypeHash {
        self.converter.target()
    }

    fn is_single(&self) -> bool {
        self.source.is_single()
    }

    fn get_and(&self) -> bool {
        self.source.get_and()
    }

    fn compute(&self, ctx: &EvalContext<'_, E>) -> Vec<Option<Value>> {
        let hierarchy = ctx.registry.hierarchy();
        self.source
            .compute(ctx)
            .into_iter()
            .map(|value| value.and_then(|v| self.converter.convert(hierarchy, &v)))
            .collect()
    }

    fn accept_change(&self, registry: &Registry, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        self.source.accept_change(registry, mode)
    }

    fn change(
        &self,
        ctx: &EvalContext<'_, E>,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError> {
        self.source.change(ctx, delta, mode)
    }

    fn to_display(&self, registry: &Registry) -> String {
        self.source.to_display(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnExpression, Literal};
    use rulekit_core::builtins;

    #[test]
    fn converts_and_drops_failures() {
        let registry = Registry::with_defaults();
        let ctx = EvalContext::detached(&registry);
        let numbers = Literal::list(
            builtins::NUMBER,
            vec![Value::from(1.9), Value::from(f64::NAN), Value::from(-3.2)],
            true,
        );
        let converted =
            ConvertedExpression::new(&registry, Box::new(numbers), builtins::INTEGER).unwrap();

        assert_eq!(converted.return_type(), builtins::INTEGER);
        let values = converted.get_all(&ctx);
        let ints: Vec<i64> = values.iter().filter_map(Value::as_integer).collect();
        assert_eq!(ints, vec![1, -3]);
    }

    #[test]
    fn missing_converter_is_a_resolution_error() {
        let registry = Registry::with_defaults();
        let err = ConvertedExpression::<()>::new(
            &registry,
            Box::new(Literal::single(true)),
            builtins::INTEGER,
        )
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "'boolean' cannot be converted to 'integer'");
    }

    #[test]
    fn declared_object_checks_at_run_time() {
        let registry = Registry::with_defaults();
        let ctx = EvalContext::detached(&registry);
        let anything = FnExpression::new("anything", builtins::OBJECT, |_: &EvalContext<'_>| {
            vec![Some(Value::from(2i64)), Some(Value::from("two"))]
        });
        let converted =
            ConvertedExpression::new(&registry, Box::new(anything), builtins::NUMBER).unwrap();
        let values = converted.get_all(&ctx);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].as_number(), Some(2.0));
    }
}
