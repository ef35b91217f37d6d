#![forbid(unsafe_code)]

//! One-shot tracker cells and the ambient tracking-frame stack.
//!
//! A [`TrackerCell`] is one registration of a re-runnable computation: its
//! payload runs at most once, and a fired cell retains nothing (the closure
//! and everything it captured is dropped on fire). Continued tracking is
//! always a brand-new cell, so "fires at most once per registration" holds
//! even when the cell was registered with many trackables.
//!
//! The frame stack is the ambient "currently tracking" context: a
//! thread-local stack of cells, pushed for the duration of one tracked
//! computation. Reads record to the innermost frame. Making the stack
//! thread-local makes the single-mutator assumption explicit per thread.

use std::cell::RefCell;
use std::rc::Rc;

/// A single registration of a re-runnable computation.
pub(crate) struct TrackerCell {
    payload: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl TrackerCell {
    pub(crate) fn new(payload: impl FnOnce() + 'static) -> Rc<Self> {
        Rc::new(Self {
            payload: RefCell::new(Some(Box::new(payload))),
        })
    }

    /// Runs the payload at most once; later calls are no-ops.
    pub(crate) fn fire(&self) {
        let payload = self.payload.borrow_mut().take();
        if let Some(payload) = payload {
            payload();
        }
    }

    /// Whether the payload has already run (or been discarded).
    pub(crate) fn is_spent(&self) -> bool {
        self.payload.borrow().is_none()
    }
}

thread_local! {
    static FRAMES: RefCell<Vec<Rc<TrackerCell>>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame on drop so the stack stays balanced when the tracked
/// computation panics.
pub(crate) struct FrameGuard {
    _private: (),
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

/// Enters a tracking frame for `cell`; reads record to it until the guard
/// drops.
pub(crate) fn push_frame(cell: Rc<TrackerCell>) -> FrameGuard {
    FRAMES.with(|frames| frames.borrow_mut().push(cell));
    FrameGuard { _private: () }
}

/// The innermost active frame, if any.
pub(crate) fn current_frame() -> Option<Rc<TrackerCell>> {
    FRAMES.with(|frames| frames.borrow().last().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn fires_at_most_once() {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let cell = TrackerCell::new(move || count_clone.set(count_clone.get() + 1));

        assert!(!cell.is_spent());
        cell.fire();
        cell.fire();
        assert_eq!(count.get(), 1);
        assert!(cell.is_spent());
    }

    #[test]
    fn frames_nest_and_unwind() {
        assert!(current_frame().is_none());

        let outer = TrackerCell::new(|| {});
        let guard = push_frame(Rc::clone(&outer));
        assert!(Rc::ptr_eq(&current_frame().unwrap(), &outer));

        {
            let inner = TrackerCell::new(|| {});
            let _inner_guard = push_frame(Rc::clone(&inner));
            assert!(Rc::ptr_eq(&current_frame().unwrap(), &inner));
        }

        assert!(Rc::ptr_eq(&current_frame().unwrap(), &outer));
        drop(guard);
        assert!(current_frame().is_none());
    }
}
