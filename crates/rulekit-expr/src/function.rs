//! Closure-backed value sources.
//!
//! Host adapters expose event data and world state as [`FnExpression`]s: a
//! closure that reads the event payload and returns its values, plus an
//! optional setter that stores changed values back.

use rulekit_core::{ChangeError, TypeHash, Value};
use rulekit_registry::Registry;

use crate::{EvalContext, Expression};

/// A value source computed by a closure.
pub struct FnExpression<E: ?Sized = ()> {
    name: String,
    return_type: TypeHash,
    single: bool,
    and: bool,
    function: Box<dyn Fn(&EvalContext<'_, E>) -> Vec<Option<Value>>>,
    setter: Option<Box<dyn Fn(&EvalContext<'_, E>, Vec<Value>)>>,
}

impl<E: ?Sized> FnExpression<E> {
    /// A plural AND source named `name`.
    pub fn new<F>(name: impl Into<String>, return_type: TypeHash, function: F) -> Self
    where
        F: Fn(&EvalContext<'_, E>) -> Vec<Option<Value>> + 'static,
    {
        Self {
            name: name.into(),
            return_type,
            single: false,
            and: true,
            function: Box::new(function),
            setter: None,
        }
    }

    /// Make the source changeable: `setter` receives the values a change
    /// produced.
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&EvalContext<'_, E>, Vec<Value>) + 'static,
    {
        self.setter = Some(Box::new(setter));
        self
    }

    /// Mark the source as single-valued.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Use the OR quantifier.
    pub fn or(mut self) -> Self {
        self.and = false;
        self
    }
}

impl<E: ?Sized> Expression<E> for FnExpression<E> {
    fn return_type(&self) -> TypeHash {
        self.return_type
    }

    fn is_single(&self) -> bool {
        self.single
    }

    fn get_and(&self) -> bool {
        self.and
    }

    fn compute(&self, ctx: &EvalContext<'_, E>) -> Vec<Option<Value>> {
        (self.function)(ctx)
    }

    fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    fn write_back(&self, ctx: &EvalContext<'_, E>, values: Vec<Value>) -> Result<(), ChangeError> {
        match &self.setter {
            Some(setter) => {
                setter(ctx, values);
                Ok(())
            }
            None => Err(ChangeError::ReadOnly {
                type_name: ctx.registry.type_name(self.return_type),
            }),
        }
    }

    fn to_display(&self, _registry: &Registry) -> String {
        self.name.clone()
    }
}
