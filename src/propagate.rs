//! Tick propagation.
//!
//! Branch first ticks are derived bottom-up from their children. Second ticks
//! are never derived.

use crate::item::Item;

/// Whether a first-tick toggle came from the user or from derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// A user flip: on a branch the new value cascades to every descendant.
    Manual,
    /// A derived flip: only the target changes before recompute.
    Derived,
}

/// Recompute every branch's first tick, children before parents.
///
/// Returns how many items changed. One pass reaches the fixed point.
pub fn propagate(items: &mut [Item]) -> usize {
    let mut changed = 0;
    for item in items.iter_mut() {
        if item.is_leaf() {
            continue;
        }
        changed += propagate(&mut item.children);
        let derived = item.all_children_first_ticked();
        if item.is_first_ticked != derived {
            item.is_first_ticked = derived;
            changed += 1;
        }
    }
    changed
}

/// Force the first tick of every item in `items`, recursively.
pub fn cascade_first_tick(items: &mut [Item], ticked: bool) {
    for item in items.iter_mut() {
        item.is_first_ticked = ticked;
        cascade_first_tick(&mut item.children, ticked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Vec<Item> {
        vec![
            Item::new("A"),
            Item::with_children(
                "B",
                vec![
                    Item::new("C"),
                    Item::with_children("D", vec![Item::new("E"), Item::new("F")]),
                ],
            ),
        ]
    }

    #[test]
    fn branch_follows_children() {
        let mut items = tree();
        cascade_first_tick(&mut items[1].children, true);
        items[1].children[1].is_first_ticked = false;

        let changed = propagate(&mut items);

        assert_eq!(changed, 2);
        assert!(items[1].children[1].is_first_ticked);
        assert!(items[1].is_first_ticked);
        assert!(!items[0].is_first_ticked);
    }

    #[test]
    fn unticked_leaf_clears_ancestors() {
        let mut items = tree();
        cascade_first_tick(&mut items, true);
        items[1].children[1].children[0].is_first_ticked = false;

        propagate(&mut items);

        assert!(!items[1].children[1].is_first_ticked);
        assert!(!items[1].is_first_ticked);
        assert!(items[1].children[0].is_first_ticked);
    }

    #[test]
    fn propagation_is_idempotent() {
        let mut items = tree();
        items[1].children[0].is_first_ticked = true;
        items[1].children[1].children[0].is_first_ticked = true;
        items[1].children[1].children[1].is_first_ticked = true;
        propagate(&mut items);
        let settled = items.clone();

        assert_eq!(propagate(&mut items), 0);
        assert_eq!(items, settled);
    }

    #[test]
    fn second_tick_is_never_derived() {
        let mut items = tree();
        cascade_first_tick(&mut items, true);
        propagate(&mut items);
        assert_eq!(items[1].is_second_ticked, Some(false));
        assert_eq!(items[1].children[1].is_second_ticked, Some(false));
        assert_eq!(items[0].is_second_ticked, None);
    }

    #[test]
    fn cascade_leaves_second_tick_alone() {
        let mut items = tree();
        items[1].children[1].is_second_ticked = Some(true);
        cascade_first_tick(&mut items, false);
        assert_eq!(items[1].children[1].is_second_ticked, Some(true));
    }
}
