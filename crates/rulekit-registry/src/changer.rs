//! Changer protocol.
//!
//! A [`Changer`] is the per-type handler for `add`/`set`/`remove`/...
//! intents. It declares per [`ChangeMode`] which delta types it accepts, and
//! applies a change to a batch of values. Script compilation consults
//! [`Changer::accept_change`] before any evaluation happens, so at run time a
//! changer only ever sees modes it declared.

use rulekit_core::{AcceptedType, ChangeError, ChangeMode, TypeHash, Value};

use crate::TypeHierarchy;

/// Per-type mutation handler.
pub trait Changer: Send + Sync {
    /// Accepted delta types for `mode`, or `None` if the mode is unsupported.
    ///
    /// Modes without a delta (DELETE, RESET) are supported by returning an
    /// empty list.
    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<AcceptedType>>;

    /// Apply `mode` to every value in `what`.
    ///
    /// The changer may mutate the values' payloads through interior
    /// mutability or replace entries in `what`. It must return
    /// [`ChangeError::Unsupported`] for a mode `accept_change` denied.
    fn change(
        &self,
        what: &mut [Value],
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError>;
}

/// Does any candidate delta type fit any accepted type?
///
/// A candidate fits when it is assignable to the accepted element type; a
/// `Sequence` marker accepts the same element types as `Single`.
pub fn accepts_types(
    hierarchy: &TypeHierarchy,
    accepted: &[AcceptedType],
    candidates: &[TypeHash],
) -> bool {
    candidates.iter().any(|&candidate| {
        accepted
            .iter()
            .any(|accepted| hierarchy.is_assignable(candidate, accepted.element()))
    })
}

/// Invoke `changer`, enforcing its own `accept_change` declaration first.
///
/// Reaching the unsupported branch means the caller skipped the compile-time
/// check; the fault is logged and returned.
pub fn apply_change(
    changer: &dyn Changer,
    type_name: &str,
    what: &mut [Value],
    delta: Option<&[Value]>,
    mode: ChangeMode,
) -> Result<(), ChangeError> {
    if changer.accept_change(mode).is_none() {
        tracing::error!(type_name, %mode, "changer invoked with an unsupported mode");
        return Err(ChangeError::Unsupported {
            mode,
            type_name: type_name.to_string(),
        });
    }
    if mode.takes_delta() && delta.is_none() {
        return Err(ChangeError::MissingDelta { mode });
    }
    changer.change(what, delta, mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulekit_core::builtins;

    /// Accepts ADD of numbers, denies everything else.
    struct AddOnly;

    impl Changer for AddOnly {
        fn accept_change(&self, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
            match mode {
                ChangeMode::Add => Some(vec![AcceptedType::Sequence(builtins::NUMBER)]),
                _ => None,
            }
        }

        fn change(
            &self,
            what: &mut [Value],
            delta: Option<&[Value]>,
            mode: ChangeMode,
        ) -> Result<(), ChangeError> {
            if mode != ChangeMode::Add {
                return Err(ChangeError::Unsupported {
                    mode,
                    type_name: "number".into(),
                });
            }
            let sum: f64 = delta.unwrap_or_default().iter().filter_map(Value::as_number).sum();
            for value in what.iter_mut() {
                *value = Value::from(value.as_number().unwrap_or(0.0) + sum);
            }
            Ok(())
        }
    }

    #[test]
    fn candidate_matching() {
        let mut hierarchy = TypeHierarchy::new();
        let player = TypeHash::from_name("player");
        let entity = TypeHash::from_name("entity");
        hierarchy.add_supertype(player, entity);

        let accepted = [AcceptedType::Single(entity)];
        assert!(accepts_types(&hierarchy, &accepted, &[player]));
        assert!(accepts_types(&hierarchy, &accepted, &[builtins::TEXT, entity]));
        assert!(!accepts_types(&hierarchy, &accepted, &[builtins::TEXT]));

        let accepted = [AcceptedType::Sequence(entity)];
        assert!(accepts_types(&hierarchy, &accepted, &[player]));
    }

    #[test]
    fn object_accepts_everything() {
        let hierarchy = TypeHierarchy::new();
        let accepted = [AcceptedType::Single(builtins::OBJECT)];
        assert!(accepts_types(&hierarchy, &accepted, &[builtins::TEXT]));
    }

    #[test]
    fn apply_change_runs_accepted_modes() {
        let mut values = vec![Value::from(1.0), Value::from(2.0)];
        let delta = [Value::from(0.5), Value::from(1.0)];
        apply_change(&AddOnly, "number", &mut values, Some(&delta[..]), ChangeMode::Add).unwrap();
        assert_eq!(values[0].as_number(), Some(2.5));
        assert_eq!(values[1].as_number(), Some(3.5));
    }

    #[test]
    fn apply_change_rejects_denied_modes() {
        let mut values = vec![Value::from(1.0)];
        let err = apply_change(&AddOnly, "number", &mut values, None, ChangeMode::Reset).unwrap_err();
        assert_eq!(
            err,
            ChangeError::Unsupported {
                mode: ChangeMode::Reset,
                type_name: "number".into(),
            }
        );
        assert_eq!(values[0].as_number(), Some(1.0));
    }

    #[test]
    fn apply_change_requires_delta() {
        let mut values = vec![Value::from(1.0)];
        let err = apply_change(&AddOnly, "number", &mut values, None, ChangeMode::Add).unwrap_err();
        assert_eq!(err, ChangeError::MissingDelta { mode: ChangeMode::Add });
    }
}
