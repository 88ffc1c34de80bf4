//! Expression evaluation for rulekit.
//!
//! Expressions are the value sources of a script: literals, variables and
//! host-provided event values. Conditions compare them through the
//! registry's comparators; effects change them through changers.
//!
//! ```
//! use rulekit_core::Relation;
//! use rulekit_expr::{Comparison, EvalContext, Literal};
//! use rulekit_registry::Registry;
//!
//! let registry = Registry::with_defaults();
//! let condition = Comparison::new(
//!     &registry,
//!     Box::new(Literal::single(3i64)),
//!     Relation::Smaller,
//!     Box::new(Literal::single(4.5)),
//! )
//! .unwrap();
//! assert!(condition.check(&EvalContext::detached(&registry)));
//! ```

mod condition;
mod context;
mod converted;
mod effect;
mod expression;
mod function;
mod literal;
mod variable;

pub use condition::Comparison;
pub use context::EvalContext;
pub use converted::ConvertedExpression;
pub use effect::Change;
pub use expression::{Expression, accepts_change, check_values};
pub use function::FnExpression;
pub use literal::Literal;
pub use variable::{LIST_SUFFIX, Variable, VariableStore};
