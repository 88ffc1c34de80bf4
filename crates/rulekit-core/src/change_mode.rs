//! Mutation intents and accepted delta types.

use std::fmt;

use crate::TypeHash;

/// What a change effect wants to do with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeMode {
    /// `add X to Y`
    Add,
    /// `set Y to X`
    Set,
    /// `remove X from Y`
    Remove,
    /// `remove all X from Y`
    RemoveAll,
    /// `delete Y`
    Delete,
    /// `reset Y`
    Reset,
}

impl ChangeMode {
    /// All six modes.
    pub const ALL: [ChangeMode; 6] = [
        ChangeMode::Add,
        ChangeMode::Set,
        ChangeMode::Remove,
        ChangeMode::RemoveAll,
        ChangeMode::Delete,
        ChangeMode::Reset,
    ];

    /// Whether this mode carries a delta. DELETE and RESET don't.
    #[inline]
    pub const fn takes_delta(self) -> bool {
        !matches!(self, ChangeMode::Delete | ChangeMode::Reset)
    }

    /// Lowercase verb used in messages.
    pub const fn name(self) -> &'static str {
        match self {
            ChangeMode::Add => "add",
            ChangeMode::Set => "set",
            ChangeMode::Remove => "remove",
            ChangeMode::RemoveAll => "remove all",
            ChangeMode::Delete => "delete",
            ChangeMode::Reset => "reset",
        }
    }
}

impl fmt::Display for ChangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A delta type a changer accepts for one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcceptedType {
    /// Exactly one value of the type.
    Single(TypeHash),
    /// Any number of values of the type.
    Sequence(TypeHash),
}

impl AcceptedType {
    /// The element type, regardless of cardinality.
    #[inline]
    pub const fn element(self) -> TypeHash {
        match self {
            AcceptedType::Single(t) | AcceptedType::Sequence(t) => t,
        }
    }

    /// Whether a plural delta is acceptable.
    #[inline]
    pub const fn is_sequence(self) -> bool {
        matches!(self, AcceptedType::Sequence(_))
    }
}
