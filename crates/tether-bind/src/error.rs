#![forbid(unsafe_code)]

use thiserror::Error;

/// Why a property access could not be served.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The property was built without a getter.
    #[error("property has no getter")]
    NoGetter,

    /// The property was built without a setter.
    #[error("property has no setter")]
    NoSetter,

    /// A late-bound property could not resolve its target object.
    #[error("property target is gone")]
    TargetGone,

    /// A write reached a resolved target that cannot accept it.
    #[error("property {target} is read-only")]
    ReadOnly {
        /// Human-readable name of the unwritable property.
        target: String,
    },
}

impl PropertyError {
    /// True when the failure may clear on its own: the object behind a
    /// late-bound or weakly-held property is gone right now but may be
    /// resolved again later. Structural failures never clear.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TargetGone)
    }
}
