#![forbid(unsafe_code)]

//! Tether public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use tether_bind as bind;
    pub use tether_collection as collection;
    pub use tether_reactive as reactive;

    pub use tether_bind::{
        Binding, BindingMode, Property, PropertyError, ValueConverter, WeakProperty, bind,
    };
    pub use tether_collection::TrackableCollection;
    pub use tether_reactive::{
        EqualityComparer, NaturalEquality, Observable, ObservableBool, ObservableFloat,
        ObservableInt, ObservableString, Trackable, TrackingScope, WeakObservable, track,
    };
}
