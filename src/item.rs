//! Checklist items.
//!
//! An item is either a leaf (no children, a single tick) or a branch (children,
//! a derived first tick plus a manually set second "verified" tick). Items own
//! their children outright; `parent_id` is a lookup hint only.

use serde::Serialize;
use uuid::Uuid;

/// Deepest `nesting_level` a tree edit may produce.
///
/// Every level costs the JSON reader two levels of recursion (the item object
/// and its `children` array), so this stays well inside what the document
/// decoder accepts.
pub const MAX_NESTING_LEVEL: u32 = 31;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub children: Vec<Item>,
    pub is_first_ticked: bool,
    /// `None` on leaves, `Some` on branches.
    pub is_second_ticked: Option<bool>,
    #[serde(rename = "parentID")]
    pub parent_id: Option<Uuid>,
    pub nesting_level: u32,
    pub is_expanded: bool,
}

impl Item {
    /// Create an unticked leaf.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            children: Vec::new(),
            is_first_ticked: false,
            is_second_ticked: None,
            parent_id: None,
            nesting_level: 0,
            is_expanded: true,
        }
    }

    /// Create an unticked item with the given children, renumbering the
    /// subtree below it.
    pub fn with_children(title: impl Into<String>, children: Vec<Item>) -> Self {
        let mut item = Self::new(title);
        item.children = children;
        if !item.children.is_empty() {
            item.is_second_ticked = Some(false);
        }
        item.renumber(None, 0);
        item
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True iff every child is fully first-ticked, recursively. Always false
    /// for a leaf.
    pub fn all_children_first_ticked(&self) -> bool {
        if self.is_leaf() {
            return false;
        }
        self.children.iter().all(|child| {
            if child.is_leaf() {
                child.is_first_ticked
            } else {
                child.is_first_ticked && child.all_children_first_ticked()
            }
        })
    }

    /// True iff every branch below is verified and every leaf below is ticked.
    ///
    /// Leaf children contribute their first tick: they have no second tick.
    pub fn all_children_second_ticked(&self) -> bool {
        if self.is_leaf() {
            return false;
        }
        self.children.iter().all(|child| {
            if child.is_leaf() {
                child.is_first_ticked
            } else {
                child.is_second_ticked == Some(true) && child.all_children_second_ticked()
            }
        })
    }

    /// Own completion criterion: ticked for a leaf, verified for a branch.
    pub fn is_done(&self) -> bool {
        if self.is_leaf() {
            self.is_first_ticked
        } else {
            self.is_second_ticked == Some(true)
        }
    }

    /// Clear all tick state in this subtree.
    pub fn reset(&mut self) {
        self.is_first_ticked = false;
        if !self.is_leaf() {
            self.is_second_ticked = Some(false);
            for child in &mut self.children {
                child.reset();
            }
        }
    }

    pub fn toggle_expanded(&mut self) {
        self.is_expanded = !self.is_expanded;
    }

    /// Number of items in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Item::subtree_len).sum::<usize>()
    }

    /// Levels below this item: 0 for a leaf.
    pub fn height(&self) -> u32 {
        self.children
            .iter()
            .map(|child| child.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Whether `id` names this item or any item below it.
    pub fn contains(&self, id: Uuid) -> bool {
        self.id == id || self.children.iter().any(|child| child.contains(id))
    }

    /// Rewrite parent links and nesting levels for this subtree.
    pub(crate) fn renumber(&mut self, parent_id: Option<Uuid>, level: u32) {
        self.parent_id = parent_id;
        self.nesting_level = level;
        let id = self.id;
        for child in &mut self.children {
            child.renumber(Some(id), level + 1);
        }
    }

    /// Restore the leaf/branch shape invariant for this subtree.
    pub(crate) fn normalize_shape(&mut self) {
        if self.is_leaf() {
            self.is_second_ticked = None;
        } else {
            self.is_second_ticked.get_or_insert(false);
            for child in &mut self.children {
                child.normalize_shape();
            }
        }
    }

    /// Iterate this subtree in depth-first pre-order.
    pub fn walk(&self) -> impl Iterator<Item = &Item> + '_ {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let item = stack.pop()?;
            stack.extend(item.children.iter().rev());
            Some(item)
        })
    }
}
