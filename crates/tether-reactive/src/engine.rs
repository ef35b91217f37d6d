#![forbid(unsafe_code)]

//! The dependency-tracking engine.
//!
//! [`track`] runs a computation while recording every observable it reads,
//! then hands control to an `on_run` callback through a [`TrackingScope`].
//! The callback receives a rerun handle; calling it (re-)evaluates the
//! computation, memoized per run. Requesting
//! [`keep_tracking`](TrackingScope::keep_tracking) re-establishes the
//! computation — as a brand-new registration with a brand-new dependency
//! set, since dependencies are read lazily on each run — the next time any
//! recorded observable changes.
//!
//! # Invariants
//!
//! 1. `on_run` is invoked exactly once per run.
//! 2. The computation is evaluated at least once: if `on_run` never calls
//!    the rerun handle, the engine calls it after `on_run` returns.
//! 3. Repeated rerun-handle calls within one run return the memoized result
//!    without re-reading dependencies.
//! 4. The continuation flag is consulted at fire time, so setting it after
//!    the handle returns (but before `on_run` does) still takes effect.
//!
//! # Failure Modes
//!
//! - **Computation panics**: the panic propagates to the rerun handle's
//!   caller for that specific run. Observables read before the failure
//!   point remain registered, so the computation can still be re-triggered
//!   by them; the ambient frame is unwound by RAII guard. A caller that
//!   catches the panic may call the handle again, which evaluates the
//!   computation afresh (nothing was memoized).

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::tracker::{self, TrackerCell};

/// The control handle passed to a tracked run's callback.
pub struct TrackingScope<T> {
    keep: Cell<bool>,
    was_called: Cell<bool>,
    memoized: RefCell<Option<T>>,
}

impl<T> TrackingScope<T> {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            keep: Cell::new(false),
            was_called: Cell::new(false),
            memoized: RefCell::new(None),
        })
    }

    /// Requests that this computation be re-established when any observable
    /// it read next changes.
    pub fn keep_tracking(&self) {
        self.keep.set(true);
    }

    /// Makes this run final: no re-runs, even if a dependency later fires.
    /// This is also the default when neither flag is touched.
    pub fn stop_tracking(&self) {
        self.keep.set(false);
    }
}

type Computation<T> = Rc<dyn Fn() -> T>;
type OnRun<T> = Rc<dyn Fn(&TrackingScope<T>, &mut dyn FnMut() -> T)>;

/// Runs `computation` under dependency tracking and hands its fate to
/// `on_run`. See the module docs for the full contract.
pub fn track<T, C, R>(computation: C, on_run: R)
where
    T: Clone + 'static,
    C: Fn() -> T + 'static,
    R: Fn(&TrackingScope<T>, &mut dyn FnMut() -> T) + 'static,
{
    track_dyn(Rc::new(computation), Rc::new(on_run));
}

fn track_dyn<T: Clone + 'static>(computation: Computation<T>, on_run: OnRun<T>) {
    let scope = TrackingScope::new();
    let mut rerun = make_rerun(
        Rc::clone(&scope),
        Rc::clone(&computation),
        Rc::clone(&on_run),
    );
    on_run(&scope, &mut rerun);
    if !scope.was_called.get() {
        rerun();
    }
}

/// Marks the run as having happened even if the computation unwinds.
struct CalledOnExit<'a>(&'a Cell<bool>);

impl Drop for CalledOnExit<'_> {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

fn make_rerun<T: Clone + 'static>(
    scope: Rc<TrackingScope<T>>,
    computation: Computation<T>,
    on_run: OnRun<T>,
) -> impl FnMut() -> T {
    move || {
        if scope.was_called.get() {
            if let Some(value) = scope.memoized.borrow().clone() {
                return value;
            }
            // The only call so far unwound before memoizing; evaluate again.
        }
        let _called = CalledOnExit(&scope.was_called);

        // One registration per run. The payload consults the continuation
        // flag at fire time and, if tracking continues, starts a fresh run
        // with a fresh scope and dependency set.
        let cell = {
            let scope = Rc::clone(&scope);
            let computation = Rc::clone(&computation);
            let on_run = Rc::clone(&on_run);
            TrackerCell::new(move || {
                if scope.keep.get() {
                    track_dyn(computation, on_run);
                }
            })
        };

        let value = {
            let _frame = tracker::push_frame(cell);
            (computation)()
        };
        *scope.memoized.borrow_mut() = Some(value.clone());
        value
    }
}
