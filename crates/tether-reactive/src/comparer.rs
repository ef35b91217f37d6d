#![forbid(unsafe_code)]

//! Pluggable equality.
//!
//! An [`EqualityComparer`] decides whether a newly written value "actually
//! changed" wherever that question matters: observable writes and collection
//! reconciliation. Any `Fn(&T, &T) -> bool` closure is a comparer.

/// A two-argument equality predicate.
pub trait EqualityComparer<T> {
    /// Whether the two values are equal for change-detection purposes.
    fn equals(&self, left: &T, right: &T) -> bool;
}

impl<T, F> EqualityComparer<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn equals(&self, left: &T, right: &T) -> bool {
        self(left, right)
    }
}

/// The type's own [`PartialEq`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalEquality;

impl<T: PartialEq> EqualityComparer<T> for NaturalEquality {
    fn equals(&self, left: &T, right: &T) -> bool {
        left == right
    }
}
