//! Property-based invariants for collection reconciliation.
//!
//! Small alphabets on purpose: duplicate elements are where the
//! move/insert/remove interplay earns its keep.

use std::cell::Cell;
use std::rc::Rc;

use proptest::prelude::*;

use tether_collection::TrackableCollection;
use tether_reactive::track;

fn collection_of(items: &[u8]) -> TrackableCollection<u8> {
    items.iter().copied().collect()
}

/// Counts notifications delivered after the initial tracked read.
fn watch(collection: &TrackableCollection<u8>) -> Rc<Cell<u32>> {
    let fires = Rc::new(Cell::new(0u32));
    let fires_clone = Rc::clone(&fires);
    let collection = collection.clone();
    let first = Cell::new(true);
    track(
        move || collection.to_vec(),
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

fn ids_of(collection: &TrackableCollection<u8>) -> Vec<u64> {
    (0..collection.len())
        .map(|index| collection.id_at(index).unwrap())
        .collect()
}

proptest! {
    #[test]
    fn reconcile_reaches_the_desired_contents(
        initial in proptest::collection::vec(0u8..6, 0..12),
        desired in proptest::collection::vec(0u8..6, 0..12),
    ) {
        let collection = collection_of(&initial);
        collection.reconcile(&desired);
        prop_assert_eq!(collection.to_vec(), desired);
    }

    #[test]
    fn reconcile_notifies_exactly_once_when_anything_changes(
        initial in proptest::collection::vec(0u8..6, 0..12),
        desired in proptest::collection::vec(0u8..6, 0..12),
    ) {
        let collection = collection_of(&initial);
        let fires = watch(&collection);
        collection.reconcile(&desired);
        let expected = u32::from(initial != desired);
        prop_assert_eq!(fires.get(), expected);
    }

    #[test]
    fn ids_stay_unique_through_reconcile(
        initial in proptest::collection::vec(0u8..6, 0..12),
        desired in proptest::collection::vec(0u8..6, 0..12),
    ) {
        let collection = collection_of(&initial);
        collection.reconcile(&desired);
        let mut ids = ids_of(&collection);
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), collection.len());
    }

    #[test]
    fn noop_reconcile_preserves_every_id(
        initial in proptest::collection::vec(0u8..6, 0..12),
    ) {
        let collection = collection_of(&initial);
        let before = ids_of(&collection);
        collection.reconcile(&initial.clone());
        prop_assert_eq!(ids_of(&collection), before);
    }
}
