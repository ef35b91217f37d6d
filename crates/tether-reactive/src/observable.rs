#![forbid(unsafe_code)]

//! Observable value cells.
//!
//! [`Observable<T>`] is one mutable, watchable value: a stored value, an
//! equality comparer, and a [`Trackable`] dependent set. Reading under a
//! tracked computation registers that computation as a dependent; writing a
//! value the comparer judges unequal fires every dependent synchronously,
//! before [`set`](Observable::set) returns.
//!
//! Cloning an `Observable` creates a new handle to the **same** cell.
//! [`WeakObservable`] is the non-owning handle: it never keeps the cell
//! alive, which is what property accessors capture so that binding
//! machinery can never pin an endpoint.
//!
//! # Invariants
//!
//! 1. `set` with a comparer-equal value replaces the stored value and
//!    notifies nobody.
//! 2. Dependents are consulted from a snapshot taken before the
//!    notification loop; re-runs may freely re-register.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::comparer::{EqualityComparer, NaturalEquality};
use crate::trackable::Trackable;

struct ObservableState<T> {
    value: RefCell<T>,
    comparer: Box<dyn EqualityComparer<T>>,
    pulse: Trackable,
}

/// A mutable value cell that notifies dependents on change.
pub struct Observable<T> {
    state: Rc<ObservableState<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.state.value.borrow())
            .field("watchers", &self.state.pulse.watcher_count())
            .finish()
    }
}

impl<T> Observable<T> {
    /// Creates an observable using the type's natural equality for change
    /// detection.
    #[must_use]
    pub fn new(initial: T) -> Self
    where
        T: PartialEq + 'static,
    {
        Self::with_comparer(initial, NaturalEquality)
    }

    /// The "comparing" variant: change detection through a caller-supplied
    /// comparer instead of the type's natural equality.
    #[must_use]
    pub fn with_comparer(initial: T, comparer: impl EqualityComparer<T> + 'static) -> Self {
        Self {
            state: Rc::new(ObservableState {
                value: RefCell::new(initial),
                comparer: Box::new(comparer),
                pulse: Trackable::new(),
            }),
        }
    }

    /// Reads the current value, registering the running tracked computation
    /// (if any) as a dependent.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.state.pulse.track();
        self.state.value.borrow().clone()
    }

    /// Borrowed access to the current value, with the same dependency
    /// registration as [`get`](Observable::get).
    ///
    /// # Panics
    ///
    /// Panics if `f` writes back into this observable (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.state.pulse.track();
        f(&self.state.value.borrow())
    }

    /// Replaces the stored value. Dependents are notified, synchronously,
    /// iff the comparer judges the new value unequal to the prior one; the
    /// stored value is replaced either way.
    pub fn set(&self, value: T) {
        let changed = !self
            .state
            .comparer
            .equals(&self.state.value.borrow(), &value);
        *self.state.value.borrow_mut() = value;
        if changed {
            self.state.pulse.notify_trackers();
        }
    }

    /// The dependent set, for composing manual notifications.
    #[must_use]
    pub fn trackable(&self) -> &Trackable {
        &self.state.pulse
    }

    /// A non-owning handle to this cell.
    #[must_use]
    pub fn downgrade(&self) -> WeakObservable<T> {
        WeakObservable {
            state: Rc::downgrade(&self.state),
        }
    }
}

/// A non-owning handle to an [`Observable`].
pub struct WeakObservable<T> {
    state: Weak<ObservableState<T>>,
}

impl<T> Clone for WeakObservable<T> {
    fn clone(&self) -> Self {
        Self {
            state: Weak::clone(&self.state),
        }
    }
}

impl<T> WeakObservable<T> {
    /// The owning handle, if the cell is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Observable<T>> {
        self.state.upgrade().map(|state| Observable { state })
    }
}

/// Scalar-specialized aliases with identical semantics to [`Observable`].
pub type ObservableBool = Observable<bool>;
/// See [`ObservableBool`].
pub type ObservableInt = Observable<i64>;
/// See [`ObservableBool`].
pub type ObservableFloat = Observable<f64>;
/// See [`ObservableBool`].
pub type ObservableString = Observable<String>;
