//! Runtime type registry for a rule-based scripting layer.
//!
//! Extensions register their types, converters and comparators into a
//! [`Registry`] while they load. Scripts are then compiled against it:
//! conditions resolve a comparator for their operand types, effects check
//! that their target accepts the requested change, and literals are parsed
//! by the registered parsers.
//!
//! # Crates
//!
//! - [`rulekit_core`]: hashes, values, relations, change modes and errors
//! - [`rulekit_registry`]: the registries and comparator resolution
//! - [`rulekit_expr`]: the expression contract, conditions and effects
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use rulekit::prelude::*;
//!
//! let registry = Registry::with_defaults();
//! let ctx = EvalContext::detached(&registry);
//! let store = Rc::new(VariableStore::new());
//!
//! let score = || Box::new(Variable::new("score", Rc::clone(&store))) as Box<dyn Expression>;
//! Change::new(&registry, score(), Some(Box::new(Literal::single(3i64))), ChangeMode::Set)?
//!     .execute(&ctx)?;
//!
//! let check = Comparison::new(&registry, score(), Relation::Smaller, Box::new(Literal::single(4.5)))?;
//! assert!(check.check(&ctx));
//! # Ok::<(), rulekit::RulekitError>(())
//! ```

pub use rulekit_core;
pub use rulekit_expr;
pub use rulekit_registry;

pub use rulekit_core::{
    AcceptedType, ChangeError, ChangeMode, FieldsError, NativeType, RegistrationError, Relation,
    ResolutionError, RulekitError, TypeHash, Value, builtins,
};
pub use rulekit_registry::Registry;

/// Everything needed to register types and build conditions and effects.
pub mod prelude {
    pub use rulekit_core::{
        AcceptedType, ChangeError, ChangeMode, Fields, NativeType, Relation, ResolutionError,
        TypeHash, Value, builtins,
    };
    pub use rulekit_expr::{
        Change, Comparison, ConvertedExpression, EvalContext, Expression, FnExpression, Literal,
        Variable, VariableStore,
    };
    pub use rulekit_registry::{
        Arithmetic, Changer, Comparator, ComparisonQuery, ConverterFlags, FnComparator,
        ParseContext, Parser, Registry, Serializer, TypeDescriptor,
    };
}
