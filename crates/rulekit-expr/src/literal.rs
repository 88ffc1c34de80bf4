//! Literal values.

use rulekit_core::{AcceptedType, ChangeError, ChangeMode, TypeHash, Value};
use rulekit_registry::{ParseContext, Registry};

use crate::{EvalContext, Expression};

/// A fixed value, or a fixed AND/OR list of values.
#[derive(Debug, Clone)]
pub struct Literal {
    values: Vec<Value>,
    return_type: TypeHash,
    and: bool,
}

impl Literal {
    /// One value, typed by its own runtime type.
    pub fn single(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            return_type: value.type_hash(),
            values: vec![value],
            and: true,
        }
    }

    /// A list declared as `return_type`; `and` selects the quantifier.
    pub fn list(return_type: TypeHash, values: Vec<Value>, and: bool) -> Self {
        Self {
            values,
            return_type,
            and,
        }
    }

    /// Parse an untyped literal, trying types in parse order.
    pub fn parse(registry: &Registry, text: &str) -> Option<Self> {
        registry
            .parse_untyped(text, ParseContext::Default)
            .map(Self::single)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl<E: ?Sized> Expression<E> for Literal {
    fn return_type(&self) -> TypeHash {
        self.return_type
    }

    fn is_single(&self) -> bool {
        self.values.len() <= 1 || !self.and
    }

    fn get_and(&self) -> bool {
        self.and
    }

    fn compute(&self, _ctx: &EvalContext<'_, E>) -> Vec<Option<Value>> {
        self.values.iter().cloned().map(Some).collect()
    }

    /// Literals are constants.
    fn accept_change(&self, _registry: &Registry, _mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        None
    }

    fn change(
        &self,
        ctx: &EvalContext<'_, E>,
        _delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError> {
        let type_name = ctx.registry.type_name(self.return_type);
        tracing::error!(type_name = %type_name, %mode, "change invoked on a literal");
        Err(ChangeError::Unsupported { mode, type_name })
    }

    fn to_display(&self, registry: &Registry) -> String {
        registry.join_display(&self.values, self.and)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulekit_core::builtins;

    #[test]
    fn parsed_literals() {
        let registry = Registry::with_defaults();
        let literal = Literal::parse(&registry, "4.5").unwrap();
        assert_eq!(Expression::<()>::return_type(&literal), builtins::NUMBER);
        assert!(Literal::parse(&registry, "not a literal").is_none());
    }

    #[test]
    fn display_joins_with_quantifier() {
        let registry = Registry::with_defaults();
        let values = vec![Value::from(1i64), Value::from(2i64)];
        let and = Literal::list(builtins::INTEGER, values.clone(), true);
        let or = Literal::list(builtins::INTEGER, values, false);
        assert_eq!(Expression::<()>::to_display(&and, &registry), "1 and 2");
        assert_eq!(Expression::<()>::to_display(&or, &registry), "1 or 2");
    }

    #[test]
    fn literals_cannot_change() {
        let registry = Registry::with_defaults();
        let ctx = EvalContext::detached(&registry);
        let literal = Literal::single(5i64);
        assert!(Expression::<()>::accept_change(&literal, &registry, ChangeMode::Set).is_none());
        assert!(literal.change(&ctx, None, ChangeMode::Delete).is_err());
    }
}
