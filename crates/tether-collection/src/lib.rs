#![forbid(unsafe_code)]

//! A trackable list.
//!
//! [`TrackableCollection`] is a `Vec`-backed list whose reads register with
//! the ambient tracking frame and whose mutations notify, as a single
//! trackable pulse. Every element carries a list-unique identifier that is
//! stable across moves, so UI layers can match rows to recycled views.
//!
//! [`transaction`](TrackableCollection::transaction) batches any number of
//! mutations into at most one notification, and
//! [`reconcile`](TrackableCollection::reconcile) edits the list in place to
//! match a desired snapshot while preserving the identity (element and id)
//! of everything that survives.
//!
//! # Invariants
//!
//! 1. Identifiers are unique within the list at all times; ids freed by
//!    removal are recycled for later insertions.
//! 2. Moving an element keeps both the element and its id; replacing the
//!    element at an index through [`set`](TrackableCollection::set) assigns
//!    a fresh id.
//! 3. Inside a transaction nothing notifies; the outermost normal exit
//!    fires one notification if anything changed, none otherwise.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use tether_reactive::Trackable;

struct CollectionState<T> {
    items: RefCell<Vec<T>>,
    ids: RefCell<Vec<u64>>,
    recycled_ids: RefCell<Vec<u64>>,
    next_id: Cell<u64>,
    txn_depth: Cell<usize>,
    dirty: Cell<bool>,
    pulse: Trackable,
}

/// A list whose reads track and whose mutations notify.
///
/// Clones share the same backing list, like clones of an observable cell.
/// Index arguments follow `Vec` conventions and panic when out of bounds.
pub struct TrackableCollection<T> {
    state: Rc<CollectionState<T>>,
}

impl<T> Clone for TrackableCollection<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<T> Default for TrackableCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TrackableCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackableCollection")
            .field("len", &self.state.items.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<T> TrackableCollection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(CollectionState {
                items: RefCell::new(Vec::new()),
                ids: RefCell::new(Vec::new()),
                recycled_ids: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                txn_depth: Cell::new(0),
                dirty: Cell::new(false),
                pulse: Trackable::default(),
            }),
        }
    }

    /// The trackable pulse behind every read of this list.
    #[must_use]
    pub fn trackable(&self) -> &Trackable {
        &self.state.pulse
    }

    pub fn len(&self) -> usize {
        self.state.pulse.track();
        self.state.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.pulse.track();
        self.state.items.borrow().is_empty()
    }

    /// Clones out the element at `index`, registering the read.
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.state.pulse.track();
        self.state.items.borrow().get(index).cloned()
    }

    /// Runs `f` over the elements without cloning, registering the read.
    /// The borrow is released before `f`'s result is returned, but `f`
    /// itself must not mutate this collection.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.state.pulse.track();
        f(&self.state.items.borrow())
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.state.pulse.track();
        self.state.items.borrow().clone()
    }

    /// The stable identifier of the element at `index`. Untracked: ids
    /// change only when the list does, and the caller is expected to have
    /// read the list already.
    #[must_use]
    pub fn id_at(&self, index: usize) -> Option<u64> {
        self.state.ids.borrow().get(index).copied()
    }

    pub fn push(&self, value: T) {
        {
            self.state.items.borrow_mut().push(value);
            let id = self.fresh_id();
            self.state.ids.borrow_mut().push(id);
        }
        self.touched();
    }

    pub fn insert(&self, index: usize, value: T) {
        {
            self.state.items.borrow_mut().insert(index, value);
            let id = self.fresh_id();
            self.state.ids.borrow_mut().insert(index, id);
        }
        self.touched();
    }

    /// Replaces the element at `index`, retiring its id and assigning a
    /// fresh one. Returns the old element.
    pub fn set(&self, index: usize, value: T) -> T {
        let old = {
            let id = self.fresh_id();
            let retired = std::mem::replace(&mut self.state.ids.borrow_mut()[index], id);
            self.state.recycled_ids.borrow_mut().push(retired);
            std::mem::replace(&mut self.state.items.borrow_mut()[index], value)
        };
        self.touched();
        old
    }

    pub fn remove_at(&self, index: usize) -> T {
        let removed = {
            let id = self.state.ids.borrow_mut().remove(index);
            self.state.recycled_ids.borrow_mut().push(id);
            self.state.items.borrow_mut().remove(index)
        };
        self.touched();
        removed
    }

    pub fn clear(&self) {
        {
            self.state.items.borrow_mut().clear();
            self.state.ids.borrow_mut().clear();
            self.state.recycled_ids.borrow_mut().clear();
            self.state.next_id.set(0);
        }
        self.touched();
    }

    /// Runs `f` with notifications suspended, then fires a single
    /// notification if any mutation happened inside. Transactions nest;
    /// only the outermost exit fires. If `f` unwinds, nothing fires.
    pub fn transaction<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.txn_depth.set(self.state.txn_depth.get() + 1);
        let guard = DepthGuard {
            depth: &self.state.txn_depth,
            dirty: &self.state.dirty,
        };
        let result = f();
        let fire = self.state.txn_depth.get() == 1 && self.state.dirty.get();
        drop(guard);
        if fire {
            self.state.pulse.notify_trackers();
        }
        result
    }

    /// Edits this list in place until it equals `desired`, preserving the
    /// element and id of everything that survives. See
    /// [`reconcile_by`](Self::reconcile_by).
    pub fn reconcile(&self, desired: &[T])
    where
        T: Clone + PartialEq,
    {
        self.reconcile_by(desired, T::eq);
    }

    /// Edits this list in place until it matches `desired` under `eq`.
    ///
    /// Walks `desired` left to right keeping a cursor into this list. An
    /// element already equal at the cursor is left untouched, id and all.
    /// Otherwise the first matching element further right is moved up to
    /// the cursor, keeping its id; with no match, a clone of the desired
    /// element is inserted with a fresh id. Trailing leftovers are removed.
    /// The whole edit is one transaction: at most one notification.
    pub fn reconcile_by(&self, desired: &[T], eq: impl Fn(&T, &T) -> bool)
    where
        T: Clone,
    {
        self.transaction(|| {
            let mut moved = 0usize;
            let mut inserted = 0usize;
            for (cursor, want) in desired.iter().enumerate() {
                let found = {
                    let items = self.state.items.borrow();
                    if items.get(cursor).is_some_and(|have| eq(have, want)) {
                        continue;
                    }
                    (cursor + 1..items.len()).find(|&index| eq(&items[index], want))
                };
                match found {
                    Some(from) => {
                        self.shift(from, cursor);
                        moved += 1;
                    }
                    None => {
                        self.insert(cursor, want.clone());
                        inserted += 1;
                    }
                }
            }
            let mut removed = 0usize;
            while self.state.items.borrow().len() > desired.len() {
                let last = self.state.items.borrow().len() - 1;
                self.remove_at(last);
                removed += 1;
            }
            if moved + inserted + removed > 0 {
                trace!(moved, inserted, removed, "collection reconciled");
            }
        });
    }

    /// Moves an element, carrying its id along.
    fn shift(&self, from: usize, to: usize) {
        {
            let mut items = self.state.items.borrow_mut();
            let mut ids = self.state.ids.borrow_mut();
            let item = items.remove(from);
            let id = ids.remove(from);
            items.insert(to, item);
            ids.insert(to, id);
        }
        self.touched();
    }

    fn fresh_id(&self) -> u64 {
        match self.state.recycled_ids.borrow_mut().pop() {
            Some(id) => id,
            None => {
                let id = self.state.next_id.get();
                self.state.next_id.set(id + 1);
                id
            }
        }
    }

    fn touched(&self) {
        if self.state.txn_depth.get() > 0 {
            self.state.dirty.set(true);
        } else {
            self.state.pulse.notify_trackers();
        }
    }
}

impl<T> FromIterator<T> for TrackableCollection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let collection = Self::new();
        for item in iter {
            collection.state.items.borrow_mut().push(item);
            let id = collection.fresh_id();
            collection.state.ids.borrow_mut().push(id);
        }
        collection
    }
}

struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
    dirty: &'a Cell<bool>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let depth = self.depth.get() - 1;
        self.depth.set(depth);
        if depth == 0 {
            // Dirt left by an unwound batch must not leak a notification
            // into a later, mutation-free transaction.
            self.dirty.set(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_reactive::track;

    /// Counts notifications delivered after the initial tracked read.
    fn watch<T: Clone + 'static>(collection: &TrackableCollection<T>) -> Rc<Cell<u32>> {
        let fires = Rc::new(Cell::new(0u32));
        let fires_clone = Rc::clone(&fires);
        let collection = collection.clone();
        let first = Cell::new(true);
        track(
            move || collection.len(),
            move |scope, rerun| {
                scope.keep_tracking();
                let _ = rerun();
                if first.replace(false) {
                    return;
                }
                fires_clone.set(fires_clone.get() + 1);
            },
        );
        fires
    }

    fn of<T: Clone>(items: &[T]) -> TrackableCollection<T> {
        items.iter().cloned().collect()
    }

    #[test]
    fn reads_track_and_mutations_notify() {
        let collection = of(&["a", "b"]);
        let fires = watch(&collection);

        collection.push("c");
        assert_eq!(fires.get(), 1);
        collection.set(0, "A");
        assert_eq!(fires.get(), 2);
        assert_eq!(collection.remove_at(1), "b");
        assert_eq!(fires.get(), 3);
        collection.insert(0, "z");
        assert_eq!(fires.get(), 4);
        collection.clear();
        assert_eq!(fires.get(), 5);
        assert!(collection.is_empty());
    }

    #[test]
    fn ids_are_stable_and_recycled() {
        let collection = of(&["a", "b", "c"]);
        assert_eq!(
            (collection.id_at(0), collection.id_at(1), collection.id_at(2)),
            (Some(0), Some(1), Some(2))
        );

        collection.remove_at(0);
        assert_eq!(collection.id_at(0), Some(1));

        // The freed id is reused for the next arrival.
        collection.push("d");
        assert_eq!(collection.id_at(2), Some(0));
    }

    #[test]
    fn set_assigns_a_fresh_id() {
        let collection = of(&["a", "b"]);
        let before = collection.id_at(1);
        assert_eq!(collection.set(1, "B"), "b");
        assert_ne!(collection.id_at(1), before);
        assert_eq!(collection.get(1), Some("B"));
    }

    #[test]
    fn transaction_batches_into_one_notification() {
        let collection = of(&[1, 2, 3]);
        let fires = watch(&collection);

        collection.transaction(|| {
            collection.push(4);
            collection.remove_at(0);
            collection.set(0, 20);
            assert_eq!(fires.get(), 0);
        });
        assert_eq!(fires.get(), 1);
        assert_eq!(collection.to_vec(), vec![20, 3, 4]);
    }

    #[test]
    fn nested_transactions_fire_on_outermost_exit() {
        let collection = of(&[1]);
        let fires = watch(&collection);

        collection.transaction(|| {
            collection.push(2);
            collection.transaction(|| collection.push(3));
            assert_eq!(fires.get(), 0);
        });
        assert_eq!(fires.get(), 1);
    }

    #[test]
    fn unwound_transaction_does_not_leak_into_the_next_one() {
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let collection = of(&[1]);
        let fires = watch(&collection);

        let result = catch_unwind(AssertUnwindSafe(|| {
            collection.transaction(|| {
                collection.push(2);
                panic!("abort the batch");
            });
        }));
        assert!(result.is_err());
        assert_eq!(fires.get(), 0);

        // A later mutation-free transaction stays silent.
        collection.transaction(|| collection.get(0));
        assert_eq!(fires.get(), 0);
    }

    #[test]
    fn empty_transaction_does_not_notify() {
        let collection = of(&[1]);
        let fires = watch(&collection);
        assert_eq!(collection.transaction(|| collection.get(0)), Some(1));
        assert_eq!(fires.get(), 0);
    }

    #[test]
    fn reconcile_replaces_everything_unrelated() {
        let collection = of(&["a", "b"]);
        collection.reconcile(&["x", "y", "z"]);
        assert_eq!(collection.to_vec(), vec!["x", "y", "z"]);
    }

    #[test]
    fn reconcile_removes_trailing_extras() {
        let collection = of(&["a", "b", "c", "d"]);
        collection.reconcile(&["a", "b"]);
        assert_eq!(collection.to_vec(), vec!["a", "b"]);
        assert_eq!((collection.id_at(0), collection.id_at(1)), (Some(0), Some(1)));
    }

    #[test]
    fn reconcile_appends_new_items() {
        let collection = of(&["a"]);
        collection.reconcile(&["a", "b", "c"]);
        assert_eq!(collection.to_vec(), vec!["a", "b", "c"]);
        assert_eq!(collection.id_at(0), Some(0));
    }

    #[test]
    fn reconcile_moves_keep_ids() {
        let collection = of(&["a", "b", "c"]);
        collection.reconcile(&["c", "a", "b"]);
        assert_eq!(collection.to_vec(), vec!["c", "a", "b"]);
        // "c" arrived at the front still carrying id 2.
        assert_eq!(
            (collection.id_at(0), collection.id_at(1), collection.id_at(2)),
            (Some(2), Some(0), Some(1))
        );
    }

    #[test]
    fn reconcile_by_leaves_matched_elements_untouched() {
        #[derive(Clone)]
        struct Item {
            key: u32,
            name: &'static str,
        }

        let collection = of(&[
            Item { key: 1, name: "first" },
            Item { key: 2, name: "second" },
        ]);
        collection.reconcile_by(
            &[
                Item { key: 2, name: "renamed second" },
                Item { key: 1, name: "renamed first" },
            ],
            |left, right| left.key == right.key,
        );

        // Matching is by key, so the stored elements are the originals.
        let names: Vec<_> = collection.with(|items| {
            items.iter().map(|item| (item.key, item.name)).collect()
        });
        assert_eq!(names, vec![(2, "second"), (1, "first")]);
    }

    #[test]
    fn reconcile_preserves_surviving_element_identity() {
        let first = Rc::new(1);
        let second = Rc::new(2);
        let collection = of(&[Rc::clone(&first), Rc::clone(&second)]);

        collection.reconcile_by(&[Rc::new(2), Rc::new(3)], |left, right| left == right);

        assert!(Rc::ptr_eq(&collection.get(0).unwrap(), &second));
        assert_eq!(*collection.get(1).unwrap(), 3);
        assert!(!collection.with(|items| items.iter().any(|item| Rc::ptr_eq(item, &first))));
    }

    #[test]
    fn reconcile_duplicates_take_the_first_match() {
        let left_dup = Rc::new(7);
        let right_dup = Rc::new(7);
        let collection = of(&[Rc::new(0), Rc::clone(&left_dup), Rc::clone(&right_dup)]);

        collection.reconcile_by(&[Rc::new(7)], |left, right| left == right);

        assert_eq!(collection.len(), 1);
        assert!(Rc::ptr_eq(&collection.get(0).unwrap(), &left_dup));
    }

    #[test]
    fn reconcile_notifies_once() {
        let collection = of(&[1, 2, 3, 4]);
        let fires = watch(&collection);
        collection.reconcile(&[4, 2, 9]);
        assert_eq!(fires.get(), 1);
        assert_eq!(collection.to_vec(), vec![4, 2, 9]);
    }

    #[test]
    fn noop_reconcile_is_silent_and_keeps_ids() {
        let collection = of(&["a", "b"]);
        let fires = watch(&collection);
        let ids_before: Vec<_> = (0..2).map(|i| collection.id_at(i)).collect();

        collection.reconcile(&["a", "b"]);

        assert_eq!(fires.get(), 0);
        let ids_after: Vec<_> = (0..2).map(|i| collection.id_at(i)).collect();
        assert_eq!(ids_before, ids_after);
    }
}
