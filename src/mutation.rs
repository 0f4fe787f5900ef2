//! Tree mutation engine.
//!
//! Every operation locates its target by id with a depth-first search over
//! the whole checklist. A missing id is reported as `Error::ItemNotFound` and
//! leaves the tree untouched.

use uuid::Uuid;

use crate::checklist::Checklist;
use crate::error::{Error, Result};
use crate::item::{Item, MAX_NESTING_LEVEL};
use crate::propagate::{self, TickMode};

/// One row of the flattened tree.
#[derive(Debug, Clone, Copy)]
pub struct FlatItem<'a> {
    pub item: &'a Item,
    /// False when any ancestor is collapsed.
    pub visible: bool,
}

/// Depth-first pre-order walk over a checklist's items.
///
/// Clone it to restart from the same point.
#[derive(Debug, Clone)]
pub struct Flattened<'a> {
    stack: Vec<(std::slice::Iter<'a, Item>, bool)>,
}

impl<'a> Iterator for Flattened<'a> {
    type Item = FlatItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (siblings, visible) = self.stack.last_mut()?;
            let visible = *visible;
            match siblings.next() {
                Some(item) => {
                    if !item.is_leaf() {
                        self.stack
                            .push((item.children.iter(), visible && item.is_expanded));
                    }
                    return Some(FlatItem { item, visible });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

fn find_mut(items: &mut [Item], id: Uuid) -> Option<&mut Item> {
    for item in items.iter_mut() {
        if item.id == id {
            return Some(item);
        }
        if let Some(found) = find_mut(&mut item.children, id) {
            return Some(found);
        }
    }
    None
}

/// Detach the subtree rooted at `id`. A parent left without children turns
/// back into a leaf.
fn take(items: &mut Vec<Item>, id: Uuid) -> Option<Item> {
    if let Some(index) = items.iter().position(|item| item.id == id) {
        return Some(items.remove(index));
    }
    for item in items.iter_mut() {
        if let Some(removed) = take(&mut item.children, id) {
            if item.children.is_empty() {
                item.is_second_ticked = None;
            }
            return Some(removed);
        }
    }
    None
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("item title cannot be empty".to_string()));
    }
    Ok(title)
}

fn not_found(id: Uuid) -> Error {
    Error::ItemNotFound(id.to_string())
}

impl Checklist {
    pub fn item_mut(&mut self, id: Uuid) -> Result<&mut Item> {
        find_mut(&mut self.items, id).ok_or_else(|| not_found(id))
    }

    /// Append a new leaf under `parent`, or at the root. Returns its id.
    pub fn add_item(&mut self, title: &str, parent: Option<Uuid>) -> Result<Uuid> {
        let mut item = Item::new(validate_title(title)?);
        let id = item.id;
        match parent {
            Some(parent_id) => {
                let parent = self.item_mut(parent_id)?;
                if parent.nesting_level >= MAX_NESTING_LEVEL {
                    return Err(Error::NestingTooDeep {
                        item: parent_id,
                        max: MAX_NESTING_LEVEL,
                    });
                }
                item.renumber(Some(parent.id), parent.nesting_level + 1);
                parent.is_second_ticked.get_or_insert(false);
                parent.children.push(item);
            }
            None => self.items.push(item),
        }
        self.settle();
        Ok(id)
    }

    /// Remove an item and its whole subtree. Returns the removed subtree.
    pub fn delete_item(&mut self, id: Uuid) -> Result<Item> {
        let removed = take(&mut self.items, id).ok_or_else(|| not_found(id))?;
        self.settle();
        Ok(removed)
    }

    /// Reattach an item (with its subtree) at the end of `new_parent`'s
    /// children, or at the end of the root list.
    pub fn move_item(&mut self, id: Uuid, new_parent: Option<Uuid>) -> Result<()> {
        let target = self.find_item(id).ok_or_else(|| not_found(id))?;
        if let Some(parent_id) = new_parent {
            if target.contains(parent_id) {
                return Err(Error::InvalidMove {
                    item: id,
                    target: parent_id,
                });
            }
        }
        let level = match new_parent {
            Some(parent_id) => {
                let parent = self
                    .find_item(parent_id)
                    .ok_or_else(|| not_found(parent_id))?;
                parent.nesting_level + 1
            }
            None => 0,
        };
        if level + target.height() > MAX_NESTING_LEVEL {
            return Err(Error::NestingTooDeep {
                item: id,
                max: MAX_NESTING_LEVEL,
            });
        }

        let mut moved = take(&mut self.items, id).ok_or_else(|| not_found(id))?;
        match new_parent {
            Some(parent_id) => {
                let parent = self.item_mut(parent_id)?;
                moved.renumber(Some(parent.id), parent.nesting_level + 1);
                parent.is_second_ticked.get_or_insert(false);
                parent.children.push(moved);
            }
            None => {
                moved.renumber(None, 0);
                self.items.push(moved);
            }
        }
        self.settle();
        Ok(())
    }

    /// Returns false when the title is unchanged.
    pub fn rename_item(&mut self, id: Uuid, title: &str) -> Result<bool> {
        let title = validate_title(title)?;
        let item = self.item_mut(id)?;
        if item.title == title {
            return Ok(false);
        }
        item.title = title.to_string();
        self.touch();
        Ok(true)
    }

    /// Flip an item's first tick and settle the tree.
    ///
    /// A manual flip on a branch pushes the new value down to every
    /// descendant before the bottom-up recompute. Returns the target's first
    /// tick after settling.
    pub fn toggle_first_tick(&mut self, id: Uuid, mode: TickMode) -> Result<bool> {
        let item = self.item_mut(id)?;
        item.is_first_ticked = !item.is_first_ticked;
        if mode == TickMode::Manual && !item.is_leaf() {
            let ticked = item.is_first_ticked;
            propagate::cascade_first_tick(&mut item.children, ticked);
        }
        self.settle();
        Ok(self.find_item(id).is_some_and(|item| item.is_first_ticked))
    }

    /// Flip a branch's verification tick. Leaves have none: returns `None`
    /// and changes nothing.
    pub fn toggle_second_tick(&mut self, id: Uuid) -> Result<Option<bool>> {
        let item = self.item_mut(id)?;
        let Some(verified) = item.is_second_ticked else {
            return Ok(None);
        };
        item.is_second_ticked = Some(!verified);
        self.settle();
        Ok(Some(!verified))
    }

    /// Flip the presentation flag only. Returns the new value.
    pub fn toggle_expanded(&mut self, id: Uuid) -> Result<bool> {
        let item = self.item_mut(id)?;
        item.toggle_expanded();
        Ok(item.is_expanded)
    }

    /// Lazy pre-order view of every item with its visibility.
    pub fn flattened(&self) -> Flattened<'_> {
        Flattened {
            stack: vec![(self.items.iter(), true)],
        }
    }
}
