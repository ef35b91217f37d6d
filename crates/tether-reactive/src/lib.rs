#![forbid(unsafe_code)]

//! Reactive primitives and the dependency-tracking engine.
//!
//! This crate provides the change-tracking core that the binding and
//! collection layers build on:
//!
//! - [`Trackable`]: the bare notification primitive — a dependent set that
//!   computations register into and that [`Trackable::notify_trackers`]
//!   fires.
//! - [`Observable`]: a shared value cell (value + equality comparer +
//!   `Trackable`) that notifies dependents when its value actually changes.
//! - [`track`]: runs a computation while recording every observable it
//!   reads, and re-runs it when any of them next change.
//!
//! # Architecture
//!
//! Everything is single-threaded shared ownership on `Rc<RefCell<..>>`.
//! Dependency edges are dynamic: each run of a tracked computation rebuilds
//! its dependent-set membership from whatever it actually read. Dependents
//! are recorded as `Weak` one-shot cells and cleaned up lazily; the strong
//! roots that keep a re-runnable computation alive live in the observables
//! it read, never in an engine-owned registry.
//!
//! # Invariants
//!
//! 1. Setting a value the comparer judges equal to the current one replaces
//!    the stored value but notifies nobody.
//! 2. A registered tracker fires at most once per registration; continued
//!    tracking is a fresh registration with a fresh dependency set.
//! 3. Notification is synchronous: every downstream re-run completes before
//!    `set` returns.
//! 4. A tracker that fires while re-running may register new dependents
//!    without corrupting the in-progress notification (the dependent set is
//!    snapshotted and cleared before the loop).

pub mod comparer;
pub mod engine;
pub mod observable;
pub mod trackable;

mod tracker;

pub use comparer::{EqualityComparer, NaturalEquality};
pub use engine::{TrackingScope, track};
pub use observable::{
    Observable, ObservableBool, ObservableFloat, ObservableInt, ObservableString, WeakObservable,
};
pub use trackable::Trackable;
