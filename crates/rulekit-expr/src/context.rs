//! Evaluation context.

use rulekit_registry::Registry;

/// What an expression sees while it is evaluated: the loaded registry and
/// the host's event payload.
pub struct EvalContext<'a, E: ?Sized = ()> {
    pub registry: &'a Registry,
    pub event: &'a E,
}

impl<'a, E: ?Sized> EvalContext<'a, E> {
    pub fn new(registry: &'a Registry, event: &'a E) -> Self {
        Self { registry, event }
    }
}

impl<'a> EvalContext<'a, ()> {
    /// A context without an event.
    pub fn detached(registry: &'a Registry) -> Self {
        Self {
            registry,
            event: &(),
        }
    }
}

impl<E: ?Sized> Clone for EvalContext<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: ?Sized> Copy for EvalContext<'_, E> {}
