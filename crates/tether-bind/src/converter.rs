#![forbid(unsafe_code)]

use std::rc::Rc;

type Convert<From, To> = Rc<dyn Fn(From) -> Option<To>>;

/// Converts values crossing a binding, in either direction.
///
/// A conversion returning `None` suppresses the write for that propagation
/// without tearing the binding down. Cross-typed converters must supply both
/// directions through [`new`](ValueConverter::new); same-typed converters
/// may supply one and get identity for the other.
pub struct ValueConverter<S, T> {
    to_target: Convert<S, T>,
    to_source: Convert<T, S>,
}

impl<S, T> Clone for ValueConverter<S, T> {
    fn clone(&self) -> Self {
        Self {
            to_target: Rc::clone(&self.to_target),
            to_source: Rc::clone(&self.to_source),
        }
    }
}

impl<S, T> ValueConverter<S, T> {
    /// A converter with both directions supplied.
    pub fn new(
        to_target: impl Fn(S) -> Option<T> + 'static,
        to_source: impl Fn(T) -> Option<S> + 'static,
    ) -> Self {
        Self {
            to_target: Rc::new(to_target),
            to_source: Rc::new(to_source),
        }
    }

    pub(crate) fn convert_to_target(&self, value: S) -> Option<T> {
        (self.to_target)(value)
    }

    pub(crate) fn convert_to_source(&self, value: T) -> Option<S> {
        (self.to_source)(value)
    }
}

impl<T: 'static> ValueConverter<T, T> {
    /// Both directions pass values through unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Self::new(Some, Some)
    }

    /// Converts source-to-target only; the reverse direction is identity.
    pub fn with_to_target(to_target: impl Fn(T) -> Option<T> + 'static) -> Self {
        Self::new(to_target, Some)
    }

    /// Converts target-to-source only; the forward direction is identity.
    pub fn with_to_source(to_source: impl Fn(T) -> Option<T> + 'static) -> Self {
        Self::new(Some, to_source)
    }
}

impl<T: 'static> Default for ValueConverter<T, T> {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_directional_converter_is_identity_the_other_way() {
        let converter = ValueConverter::with_to_target(|value: i32| Some(value * 2));
        assert_eq!(converter.convert_to_target(3), Some(6));
        assert_eq!(converter.convert_to_source(3), Some(3));
    }

    #[test]
    fn conversion_can_suppress_a_value() {
        let converter = ValueConverter::new(|value: i32| (value >= 0).then_some(value), Some);
        assert_eq!(converter.convert_to_target(5), Some(5));
        assert_eq!(converter.convert_to_target(-1), None);
    }

    #[test]
    fn cross_typed_converter() {
        let converter: ValueConverter<i32, String> =
            ValueConverter::new(|n: i32| Some(n.to_string()), |s: String| s.parse().ok());
        assert_eq!(converter.convert_to_target(42), Some("42".to_string()));
        assert_eq!(converter.convert_to_source("7".to_string()), Some(7));
        assert_eq!(converter.convert_to_source("nope".to_string()), None);
    }
}
