#![forbid(unsafe_code)]

//! Property abstraction and declarative value binding.
//!
//! This crate layers on top of `tether-reactive`: a [`Property`] gives
//! uniform read/write access to a value (an observable cell, hand-written
//! accessors, or a late-bound path), and a [`Binding`] keeps two properties
//! in sync through the tracking engine in one of four [`BindingMode`]s,
//! with optional [`ValueConverter`] transformation in flight.

pub mod binding;
pub mod converter;
pub mod error;
pub mod property;

pub use binding::{Binding, BindingMode, bind};
pub use converter::ValueConverter;
pub use error::PropertyError;
pub use property::{Property, WeakProperty};
