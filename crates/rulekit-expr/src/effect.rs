//! Change effects: `set X to Y`, `add Y to X`, `remove Y from X`,
//! `remove all Y from X`, `delete X`, `reset X`.
//!
//! Acceptance is checked when the effect is built, so executing it can only
//! fail if a target lies about what it accepts.

use rulekit_core::{AcceptedType, ChangeError, ChangeMode, ResolutionError, TypeHash, builtins};
use rulekit_registry::Registry;

use crate::{EvalContext, Expression};

/// A change applied to an expression.
pub struct Change<E: ?Sized = ()> {
    target: Box<dyn Expression<E>>,
    delta: Option<Box<dyn Expression<E>>>,
    mode: ChangeMode,
    /// Element types the delta is converted to, in preference order.
    accepted: Vec<TypeHash>,
}

impl<E: ?Sized> Change<E> {
    /// Build a change, validating the target and the delta's type.
    pub fn new(
        registry: &Registry,
        target: Box<dyn Expression<E>>,
        delta: Option<Box<dyn Expression<E>>>,
        mode: ChangeMode,
    ) -> Result<Self, ResolutionError> {
        let describe = |expr: &dyn Expression<E>| expr.to_display(registry);
        let Some(accepted) = target.accept_change(registry, mode) else {
            return Err(ResolutionError::ChangeNotAccepted {
                mode,
                target: describe(target.as_ref()),
            });
        };

        let accepted = match (&delta, mode.takes_delta()) {
            (None, true) => return Err(ResolutionError::MissingDelta { mode }),
            (None, false) => Vec::new(),
            (Some(delta), _) => Self::fit_delta(registry, target.as_ref(), delta.as_ref(), mode, accepted)?,
        };

        Ok(Self {
            target,
            delta,
            mode,
            accepted: accepted.into_iter().map(AcceptedType::element).collect(),
        })
    }

    /// Accepted types the delta can be converted to.
    fn fit_delta(
        registry: &Registry,
        target: &dyn Expression<E>,
        delta: &dyn Expression<E>,
        mode: ChangeMode,
        accepted: Vec<AcceptedType>,
    ) -> Result<Vec<AcceptedType>, ResolutionError> {
        let delta_type = delta.return_type();
        let fitting: Vec<AcceptedType> = if delta_type == builtins::OBJECT {
            accepted
        } else {
            accepted
                .into_iter()
                .filter(|a| registry.converter(delta_type, a.element()).is_some())
                .collect()
        };

        if fitting.is_empty() {
            return Err(ResolutionError::IncompatibleDelta {
                mode,
                target: target.to_display(registry),
                delta: registry.type_name(delta_type),
            });
        }
        if !delta.is_single() && !fitting.iter().any(|a| a.is_sequence()) {
            return Err(ResolutionError::PluralDelta {
                mode,
                target: target.to_display(registry),
            });
        }
        Ok(fitting)
    }

    pub fn mode(&self) -> ChangeMode {
        self.mode
    }

    /// Run the change.
    ///
    /// An empty delta turns SET into DELETE when the target accepts it;
    /// otherwise the change is skipped.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn execute(&self, ctx: &EvalContext<'_, E>) -> Result<(), ChangeError> {
        let registry = ctx.registry;
        let Some(delta) = &self.delta else {
            return self.target.change(ctx, None, self.mode);
        };

        let values: Vec<_> = delta
            .get_array(ctx)
            .iter()
            .filter_map(|value| registry.convert_to_any(value, &self.accepted))
            .collect();

        if values.is_empty() {
            if self.mode == ChangeMode::Set
                && self.target.accept_change(registry, ChangeMode::Delete).is_some()
            {
                return self.target.change(ctx, None, ChangeMode::Delete);
            }
            tracing::debug!(
                target_expr = %self.target.to_display(registry),
                mode = %self.mode,
                "empty delta; change skipped"
            );
            return Ok(());
        }
        self.target.change(ctx, Some(values.as_slice()), self.mode)
    }

    pub fn to_display(&self, registry: &Registry) -> String {
        let target = self.target.to_display(registry);
        let delta = self.delta.as_ref().map(|d| d.to_display(registry));
        match (self.mode, delta) {
            (ChangeMode::Set, Some(delta)) => format!("set {target} to {delta}"),
            (ChangeMode::Add, Some(delta)) => format!("add {delta} to {target}"),
            (mode @ (ChangeMode::Remove | ChangeMode::RemoveAll), Some(delta)) => {
                format!("{mode} {delta} from {target}")
            }
            (mode, _) => format!("{mode} {target}"),
        }
    }
}
