//! Error types for every phase of the type registry.
//!
//! ## Error Hierarchy
//!
//! ```text
//! RulekitError (top-level wrapper)
//! ├── RegistrationError - load-time defects in extension registrations
//! ├── ResolutionError   - compile-time lookup misses (user-facing messages)
//! ├── ChangeError       - changer contract violations at evaluation time
//! └── FieldsError       - malformed persisted fields
//! ```
//!
//! Registration and resolution errors are raised before any evaluation
//! happens. Evaluation itself only fails through [`ChangeError`], which
//! signals a caller that skipped the compile-time acceptance check.

use thiserror::Error;

use crate::{ChangeMode, Relation};

// ============================================================================
// Registration Errors
// ============================================================================

/// Defects detected while extensions register types, converters and
/// comparators. These are fatal at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A type with this code name is already registered.
    #[error("duplicate type: '{0}' is already registered")]
    DuplicateCodeName(String),

    /// The code name contains characters outside `[a-z0-9]` and inner dashes.
    #[error("invalid code name '{0}': only lowercase letters, digits and inner dashes are allowed")]
    InvalidCodeName(String),

    /// A descriptor component was set twice.
    #[error("type '{type_name}' already has a {component}")]
    DuplicateComponent {
        /// The descriptor's code name.
        type_name: String,
        /// Which component was set twice ("parser", "serializer", ...).
        component: &'static str,
    },

    /// A descriptor has both a serializer and a serialize-as redirection.
    #[error("type '{0}' cannot have both a serializer and a serialize-as type")]
    ConflictingSerializer(String),

    /// An explicit converter for this pair already exists.
    #[error("duplicate converter from '{from}' to '{to}'")]
    DuplicateConverter { from: String, to: String },

    /// A converter from a type to itself.
    #[error("converter from '{0}' to itself is not allowed")]
    IdentityConverter(String),

    /// A comparator for this exact pair already exists.
    #[error("duplicate comparator for '{first}' and '{second}'")]
    DuplicateComparator { first: String, second: String },

    /// The descriptor's before/after hints form a cycle.
    #[error("ordering hints of type '{0}' form a cycle")]
    OrderingCycle(String),

    /// A supertype link would make the hierarchy cyclic.
    #[error("'{supertype}' cannot be a supertype of '{subtype}': the hierarchy would become cyclic")]
    HierarchyCycle { subtype: String, supertype: String },
}

// ============================================================================
// Resolution Errors
// ============================================================================

/// Compile-time resolution failures, reported to script authors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// No comparator (direct or through coercion) relates these types.
    #[error("{} cannot be compared", describe_operands(.first, .second, .third))]
    Incomparable {
        first: String,
        second: String,
        third: Option<String>,
    },

    /// The comparator found only supports equality.
    #[error("'{first}' and '{second}' can only be compared for equality, not '{relation}'")]
    UnsupportedRelation {
        relation: Relation,
        first: String,
        second: String,
    },

    /// The target cannot be changed with this mode.
    #[error("'{target}' cannot be changed with '{mode}'")]
    ChangeNotAccepted { mode: ChangeMode, target: String },

    /// The delta's type is not among the accepted ones.
    #[error("'{target}' cannot be changed with '{mode}' using '{delta}'")]
    IncompatibleDelta {
        mode: ChangeMode,
        target: String,
        delta: String,
    },

    /// A plural delta was given where only one value is accepted.
    #[error("only a single value can be used to {mode} '{target}'")]
    PluralDelta { mode: ChangeMode, target: String },

    /// The mode needs a delta but none was given.
    #[error("'{mode}' requires a value")]
    MissingDelta { mode: ChangeMode },

    /// No converter exists between the two types.
    #[error("'{from}' cannot be converted to '{to}'")]
    NoConverter { from: String, to: String },
}

fn describe_operands(first: &str, second: &str, third: &Option<String>) -> String {
    match third {
        Some(third) => format!("'{first}', '{second}' and '{third}'"),
        None => format!("'{first}' and '{second}'"),
    }
}

// ============================================================================
// Change Errors
// ============================================================================

/// Faults raised by changers at evaluation time.
///
/// These indicate a defect in the caller: compile-time checks
/// (`accept_change`) are expected to have ruled them out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChangeError {
    /// `change` was invoked with a mode the changer does not accept.
    #[error("unsupported operation: '{type_name}' does not support '{mode}'")]
    Unsupported { mode: ChangeMode, type_name: String },

    /// A mode that takes a delta was invoked without one.
    #[error("'{mode}' was invoked without a delta")]
    MissingDelta { mode: ChangeMode },

    /// The source has nowhere to store changed values.
    #[error("values of '{type_name}' cannot be written back")]
    ReadOnly { type_name: String },
}

// ============================================================================
// Fields Errors
// ============================================================================

/// Malformed persisted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldsError {
    /// The field is absent.
    #[error("missing field '{0}'")]
    Missing(String),

    /// The field holds a different kind of value.
    #[error("field '{field}' should be {expected} but is {found}")]
    Mismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

// ============================================================================
// Top-level
// ============================================================================

/// Any error produced by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulekitError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Change(#[from] ChangeError),

    #[error(transparent)]
    Fields(#[from] FieldsError),
}
