#![forbid(unsafe_code)]

//! The bare notification primitive.
//!
//! A [`Trackable`] owns one dependent set and nothing else. [`Observable`]
//! and the collection type embed one; raw `Trackable`s are useful when
//! wrapping an object that notifies through a listener pattern — call
//! [`Trackable::track`] in the getter and [`Trackable::notify_trackers`]
//! when the listener reports a change.
//!
//! # Liveness
//!
//! The dependent set is two parallel lists:
//!
//! - `watchers`: weak back-references consulted at notification time. The
//!   notification list never owns a tracker.
//! - `anchors`: strong roots for re-runnable computations, attached by the
//!   engine at read time. Anchoring through the values a computation read is
//!   what lets a standing computation (or a discarded binding) keep firing
//!   exactly as long as its inputs remain reachable, with no registry to
//!   tear down.
//!
//! Both lists are snapshotted and cleared at the start of every
//! notification; membership is rebuilt from scratch by whatever re-runs.
//! A fired cell is an empty husk, so a stale anchor retains no user state.
//!
//! [`Observable`]: crate::observable::Observable

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::tracker::{self, TrackerCell};

/// A dependent set that computations register into and that
/// [`notify_trackers`](Trackable::notify_trackers) fires.
#[derive(Default)]
pub struct Trackable {
    watchers: RefCell<Vec<Weak<TrackerCell>>>,
    anchors: RefCell<Vec<Rc<TrackerCell>>>,
}

impl Trackable {
    /// Creates a trackable with no dependents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the innermost running tracked computation, if any, as a
    /// dependent of this trackable. Idempotent within a run; a no-op when
    /// nothing is tracking.
    pub fn track(&self) {
        let Some(cell) = tracker::current_frame() else {
            return;
        };
        let mut watchers = self.watchers.borrow_mut();
        // Lazy cleanup of registrations that died without this trackable
        // ever firing.
        watchers.retain(|watcher| watcher.strong_count() > 0);
        if watchers
            .iter()
            .any(|watcher| watcher.as_ptr() == Rc::as_ptr(&cell))
        {
            return;
        }
        watchers.push(Rc::downgrade(&cell));
        drop(watchers);

        let mut anchors = self.anchors.borrow_mut();
        anchors.retain(|anchor| !anchor.is_spent());
        anchors.push(cell);
    }

    /// Fires every currently registered dependent, synchronously.
    ///
    /// Both lists are taken before the loop: a firing tracker may read this
    /// trackable again and re-register without corrupting the iteration, and
    /// anchors stay alive until every watcher has been consulted.
    pub fn notify_trackers(&self) {
        let watchers = self.watchers.take();
        let anchors = self.anchors.take();
        if watchers.is_empty() {
            return;
        }
        tracing::trace!(watchers = watchers.len(), "notifying trackers");
        for watcher in &watchers {
            if let Some(cell) = watcher.upgrade() {
                cell.fire();
            }
        }
        drop(anchors);
    }

    /// How many live dependents are currently registered.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.watchers
            .borrow()
            .iter()
            .filter(|watcher| watcher.strong_count() > 0)
            .count()
    }
}

impl std::fmt::Debug for Trackable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trackable")
            .field("watchers", &self.watchers.borrow().len())
            .field("anchors", &self.anchors.borrow().len())
            .finish()
    }
}
