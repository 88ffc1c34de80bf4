//! Comparison relations.
//!
//! A [`Relation`] is both what a comparator returns ("the left value is
//! GREATER than the right one") and what a condition asks for ("is the left
//! value GREATER_OR_EQUAL to the right one?"). [`Relation::is`] connects the
//! two.

use std::cmp::Ordering;
use std::fmt;

use ordered_float::OrderedFloat;

/// Relation between two compared values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Smaller,
    SmallerOrEqual,
}

impl Relation {
    /// All six relations.
    pub const ALL: [Relation; 6] = [
        Relation::Equal,
        Relation::NotEqual,
        Relation::Greater,
        Relation::GreaterOrEqual,
        Relation::Smaller,
        Relation::SmallerOrEqual,
    ];

    /// `Equal` if `equal`, otherwise `NotEqual`.
    #[inline]
    pub const fn from_bool(equal: bool) -> Self {
        if equal { Relation::Equal } else { Relation::NotEqual }
    }

    /// Map a total ordering of `left` against `right`.
    #[inline]
    pub const fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Relation::Smaller,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Greater,
        }
    }

    /// Relation of `left` to `right` by the sign of `left - right`.
    #[inline]
    pub fn from_difference(difference: i64) -> Self {
        Self::from_ordering(difference.cmp(&0))
    }

    /// Relation of two floats.
    ///
    /// Uses the total order of [`OrderedFloat`], so NaN compares equal to
    /// itself and greater than every other number.
    pub fn from_floats(left: f64, right: f64) -> Self {
        Self::from_ordering(OrderedFloat(left).cmp(&OrderedFloat(right)))
    }

    /// Does this relation hold whenever `other` holds?
    ///
    /// `GreaterOrEqual.is(Greater)` is true: if a comparator reports that the
    /// left value is greater, it is also greater-or-equal. Every relation
    /// subsumes itself.
    pub const fn is(self, other: Relation) -> bool {
        match self {
            Relation::Equal => matches!(other, Relation::Equal),
            Relation::NotEqual => {
                matches!(other, Relation::NotEqual | Relation::Greater | Relation::Smaller)
            }
            Relation::Greater => matches!(other, Relation::Greater),
            Relation::GreaterOrEqual => {
                matches!(other, Relation::GreaterOrEqual | Relation::Greater | Relation::Equal)
            }
            Relation::Smaller => matches!(other, Relation::Smaller),
            Relation::SmallerOrEqual => {
                matches!(other, Relation::SmallerOrEqual | Relation::Smaller | Relation::Equal)
            }
        }
    }

    /// Logical negation: `Greater` becomes `SmallerOrEqual`.
    pub const fn inverse(self) -> Self {
        match self {
            Relation::Equal => Relation::NotEqual,
            Relation::NotEqual => Relation::Equal,
            Relation::Greater => Relation::SmallerOrEqual,
            Relation::GreaterOrEqual => Relation::Smaller,
            Relation::Smaller => Relation::GreaterOrEqual,
            Relation::SmallerOrEqual => Relation::Greater,
        }
    }

    /// The relation that holds when the operands are swapped.
    pub const fn switched(self) -> Self {
        match self {
            Relation::Equal => Relation::Equal,
            Relation::NotEqual => Relation::NotEqual,
            Relation::Greater => Relation::Smaller,
            Relation::GreaterOrEqual => Relation::SmallerOrEqual,
            Relation::Smaller => Relation::Greater,
            Relation::SmallerOrEqual => Relation::GreaterOrEqual,
        }
    }

    /// Whether this relation needs an ordering (anything but equal/not equal).
    #[inline]
    pub const fn is_ordering(self) -> bool {
        !matches!(self, Relation::Equal | Relation::NotEqual)
    }

    /// Human-readable phrase, e.g. "greater than or equal to".
    pub const fn phrase(self) -> &'static str {
        match self {
            Relation::Equal => "equal to",
            Relation::NotEqual => "not equal to",
            Relation::Greater => "greater than",
            Relation::GreaterOrEqual => "greater than or equal to",
            Relation::Smaller => "smaller than",
            Relation::SmallerOrEqual => "smaller than or equal to",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}
