//! Named variables.
//!
//! Variables are the main changeable expression. A name ending in `::*`
//! denotes a list variable holding any number of values; every other name
//! holds at most one. Values of any type can be stored, so the accepted
//! delta type is always `object`.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use rulekit_core::{AcceptedType, ChangeError, ChangeMode, Relation, TypeHash, Value, builtins};
use rulekit_registry::{Registry, apply_change};

use crate::{EvalContext, Expression};

/// Suffix marking a list variable.
pub const LIST_SUFFIX: &str = "::*";

/// Backing storage for variables.
#[derive(Debug, Default)]
pub struct VariableStore {
    slots: RefCell<FxHashMap<String, Vec<Value>>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current values of `name`, empty when unset.
    pub fn get(&self, name: &str) -> Vec<Value> {
        self.slots.borrow().get(name).cloned().unwrap_or_default()
    }

    /// Replace the values of `name`. An empty list unsets it.
    pub fn set(&self, name: &str, values: Vec<Value>) {
        let mut slots = self.slots.borrow_mut();
        if values.is_empty() {
            slots.remove(name);
        } else {
            slots.insert(name.to_string(), values);
        }
    }

    pub fn delete(&self, name: &str) {
        self.slots.borrow_mut().remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.borrow().contains_key(name)
    }

    /// Number of set variables.
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

/// A reference to a named variable.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    return_type: TypeHash,
    store: Rc<VariableStore>,
}

impl Variable {
    /// A variable declared as `object`.
    pub fn new(name: impl Into<String>, store: Rc<VariableStore>) -> Self {
        Self {
            name: name.into(),
            return_type: builtins::OBJECT,
            store,
        }
    }

    /// Read values converted to `ty`.
    pub fn typed(mut self, ty: TypeHash) -> Self {
        self.return_type = ty;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_list(&self) -> bool {
        self.name.ends_with(LIST_SUFFIX)
    }

    fn unsupported(&self, mode: ChangeMode) -> ChangeError {
        tracing::error!(variable = %self.name, %mode, "variable changed with an unsupported mode");
        ChangeError::Unsupported {
            mode,
            type_name: "variable".to_string(),
        }
    }

    fn reset_values(registry: &Registry, values: &mut [Value]) -> Result<(), ChangeError> {
        for value in values.iter_mut() {
            let ty = value.type_hash();
            let Some(changer) = registry.changer_for(ty) else {
                continue;
            };
            if changer.accept_change(ChangeMode::Reset).is_some() {
                let type_name = registry.type_name(ty);
                let slot = std::slice::from_mut(value);
                apply_change(changer.as_ref(), &type_name, slot, None, ChangeMode::Reset)?;
            }
        }
        Ok(())
    }

    /// ADD/REMOVE on a single value: arithmetic first, then the value's
    /// own changer. `None` when neither applies.
    fn shift(
        registry: &Registry,
        current: Value,
        delta: &[Value],
        mode: ChangeMode,
    ) -> Result<Option<Value>, ChangeError> {
        let ty = current.type_hash();
        if let Some(arithmetic) = registry.arithmetic_for(ty) {
            let relative = arithmetic.relative_type();
            let mut value = current;
            for d in delta {
                let step = |d: &Value| match mode {
                    ChangeMode::Add => arithmetic.add(&value, d),
                    _ => arithmetic.subtract(&value, d),
                };
                let next = step(d).or_else(|| registry.convert(d, relative).and_then(|d| step(&d)));
                match next {
                    Some(next) => value = next,
                    None => tracing::trace!(delta = ?d, "delta has no arithmetic result"),
                }
            }
            return Ok(Some(value));
        }

        let Some(changer) = registry.changer_for(ty) else {
            return Ok(None);
        };
        let Some(accepted) = changer.accept_change(mode) else {
            return Ok(None);
        };
        let targets: Vec<TypeHash> = accepted.iter().map(|a| a.element()).collect();
        let delta: Vec<Value> = delta
            .iter()
            .filter_map(|d| registry.convert_to_any(d, &targets))
            .collect();
        let mut values = [current];
        apply_change(changer.as_ref(), &registry.type_name(ty), &mut values, Some(delta.as_slice()), mode)?;
        let [value] = values;
        Ok(Some(value))
    }
}

fn equal(registry: &Registry, a: &Value, b: &Value) -> bool {
    a.ptr_eq(b) || registry.compare(a, b) == Some(Relation::Equal)
}

impl<E: ?Sized> Expression<E> for Variable {
    fn return_type(&self) -> TypeHash {
        self.return_type
    }

    fn is_single(&self) -> bool {
        !self.is_list()
    }

    fn compute(&self, ctx: &EvalContext<'_, E>) -> Vec<Option<Value>> {
        let values = self.store.get(&self.name);
        if self.return_type == builtins::OBJECT {
            return values.into_iter().map(Some).collect();
        }
        values
            .iter()
            .map(|value| ctx.registry.convert(value, self.return_type))
            .collect()
    }

    fn accept_change(&self, _registry: &Registry, mode: ChangeMode) -> Option<Vec<AcceptedType>> {
        match mode {
            ChangeMode::Set if self.is_list() => Some(vec![AcceptedType::Sequence(builtins::OBJECT)]),
            ChangeMode::Set => Some(vec![AcceptedType::Single(builtins::OBJECT)]),
            ChangeMode::Add | ChangeMode::Remove => {
                Some(vec![AcceptedType::Sequence(builtins::OBJECT)])
            }
            ChangeMode::RemoveAll if self.is_list() => {
                Some(vec![AcceptedType::Sequence(builtins::OBJECT)])
            }
            ChangeMode::RemoveAll => None,
            ChangeMode::Delete | ChangeMode::Reset => Some(Vec::new()),
        }
    }

    fn change(
        &self,
        ctx: &EvalContext<'_, E>,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<(), ChangeError> {
        let registry = ctx.registry;
        if Expression::<E>::accept_change(self, registry, mode).is_none() {
            return Err(self.unsupported(mode));
        }
        let delta = match (mode.takes_delta(), delta) {
            (true, None) => return Err(ChangeError::MissingDelta { mode }),
            (_, delta) => delta.unwrap_or_default(),
        };

        match mode {
            ChangeMode::Delete => self.store.delete(&self.name),
            ChangeMode::Set if self.is_list() => self.store.set(&self.name, delta.to_vec()),
            ChangeMode::Set => self.store.set(&self.name, delta.iter().take(1).cloned().collect()),
            ChangeMode::Reset => {
                let mut values = self.store.get(&self.name);
                Self::reset_values(registry, &mut values)?;
                self.store.set(&self.name, values);
            }
            ChangeMode::Add if self.is_list() => {
                let mut values = self.store.get(&self.name);
                values.extend(delta.iter().cloned());
                self.store.set(&self.name, values);
            }
            ChangeMode::Remove | ChangeMode::RemoveAll if self.is_list() => {
                let mut values = self.store.get(&self.name);
                for d in delta {
                    if mode == ChangeMode::RemoveAll {
                        values.retain(|v| !equal(registry, v, d));
                    } else if let Some(index) = values.iter().position(|v| equal(registry, v, d)) {
                        values.remove(index);
                    }
                }
                self.store.set(&self.name, values);
            }
            ChangeMode::Add | ChangeMode::Remove => {
                let current = self.store.get(&self.name).into_iter().next();
                let (current, delta) = match current {
                    Some(current) => (current, delta),
                    None if mode == ChangeMode::Add => match delta.split_first() {
                        Some((first, rest)) => (first.clone(), rest),
                        None => return Ok(()),
                    },
                    None => return Ok(()),
                };
                match Self::shift(registry, current, delta, mode)? {
                    Some(value) => self.store.set(&self.name, vec![value]),
                    None => tracing::debug!(
                        variable = %self.name,
                        %mode,
                        "value has neither arithmetic nor a changer; change skipped"
                    ),
                }
            }
            ChangeMode::RemoveAll => return Err(self.unsupported(mode)),
        }
        Ok(())
    }

    fn to_display(&self, _registry: &Registry) -> String {
        format!("{{{}}}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::from(i)
    }

    fn delta(values: &[Value]) -> Option<&[Value]> {
        Some(values)
    }

    fn setup() -> (Registry, Rc<VariableStore>) {
        (Registry::with_defaults(), Rc::new(VariableStore::new()))
    }

    #[test]
    fn single_variable_arithmetic() {
        let (registry, store) = setup();
        let ctx = EvalContext::detached(&registry);
        let points = Variable::new("points", Rc::clone(&store));

        points.change(&ctx, delta(&[int(3)]), ChangeMode::Add).unwrap();
        points.change(&ctx, delta(&[int(4), Value::from(0.5)]), ChangeMode::Add).unwrap();
        assert_eq!(store.get("points")[0].as_number(), Some(7.5));

        // The fractional result promoted the variable to a number.
        points.change(&ctx, delta(&[Value::from(0.5)]), ChangeMode::Remove).unwrap();
        assert_eq!(store.get("points")[0].as_number(), Some(7.0));
    }

    #[test]
    fn text_variables_use_the_text_changer() {
        let (registry, store) = setup();
        let ctx = EvalContext::detached(&registry);
        let greeting = Variable::new("greeting", Rc::clone(&store));

        greeting.change(&ctx, delta(&[Value::from("hello")]), ChangeMode::Set).unwrap();
        greeting.change(&ctx, delta(&[Value::from(" world")]), ChangeMode::Add).unwrap();
        assert_eq!(store.get("greeting")[0].as_text(), Some("hello world"));

        greeting.change(&ctx, None, ChangeMode::Reset).unwrap();
        assert_eq!(store.get("greeting")[0].as_text(), Some(""));
    }

    #[test]
    fn list_variables() {
        let (registry, store) = setup();
        let ctx = EvalContext::detached(&registry);
        let list = Variable::new("scores::*", Rc::clone(&store));
        assert!(!Expression::<()>::is_single(&list));

        list.change(&ctx, delta(&[int(1), int(2), int(1), int(3)]), ChangeMode::Set).unwrap();
        list.change(&ctx, delta(&[Value::from(1.0)]), ChangeMode::Remove).unwrap();
        let remaining: Vec<_> = store.get("scores::*").iter().filter_map(Value::as_integer).collect();
        assert_eq!(remaining, vec![2, 1, 3]);

        list.change(&ctx, delta(&[int(1)]), ChangeMode::RemoveAll).unwrap();
        list.change(&ctx, delta(&[int(9)]), ChangeMode::Add).unwrap();
        let remaining: Vec<_> = store.get("scores::*").iter().filter_map(Value::as_integer).collect();
        assert_eq!(remaining, vec![2, 3, 9]);

        list.change(&ctx, None, ChangeMode::Delete).unwrap();
        assert!(!store.contains("scores::*"));
    }

    #[test]
    fn remove_all_needs_a_list() {
        let (registry, store) = setup();
        let ctx = EvalContext::detached(&registry);
        let single = Variable::new("x", store);
        assert!(Expression::<()>::accept_change(&single, &registry, ChangeMode::RemoveAll).is_none());
        assert_eq!(
            single.change(&ctx, delta(&[int(1)]), ChangeMode::RemoveAll),
            Err(ChangeError::Unsupported {
                mode: ChangeMode::RemoveAll,
                type_name: "variable".into(),
            })
        );
    }

    #[test]
    fn single_set_keeps_first_value() {
        let (registry, store) = setup();
        let ctx = EvalContext::detached(&registry);
        let x = Variable::new("x", Rc::clone(&store));
        x.change(&ctx, delta(&[int(1), int(2)]), ChangeMode::Set).unwrap();
        assert_eq!(store.get("x").len(), 1);
        assert!(matches!(
            x.change(&ctx, None, ChangeMode::Set),
            Err(ChangeError::MissingDelta { mode: ChangeMode::Set })
        ));
    }

    #[test]
    fn typed_reads_convert() {
        let (registry, store) = setup();
        let ctx = EvalContext::detached(&registry);
        store.set("x", vec![int(2)]);
        store.set("flag", vec![Value::from(true)]);

        let x = Variable::new("x", Rc::clone(&store)).typed(builtins::NUMBER);
        assert_eq!(x.get_single(&ctx).unwrap().as_number(), Some(2.0));

        let flag = Variable::new("flag", Rc::clone(&store)).typed(builtins::NUMBER);
        assert!(flag.get_all(&ctx).is_empty());
        assert_eq!(Expression::<()>::to_display(&flag, &registry), "{flag}");
    }
}
