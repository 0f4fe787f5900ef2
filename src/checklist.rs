//! Checklist aggregate: a named item tree plus metadata.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::item::Item;
use crate::propagate;

/// Accepted range for reset-after-days.
pub const RESET_DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=365;

/// Check a reset-after-days value against `RESET_DAYS_RANGE`.
pub fn validate_reset_days(days: u32) -> Result<u32> {
    if RESET_DAYS_RANGE.contains(&days) {
        Ok(days)
    } else {
        Err(Error::InvalidArgument(format!(
            "reset-after-days must be between {} and {}, got {days}",
            RESET_DAYS_RANGE.start(),
            RESET_DAYS_RANGE.end()
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: Uuid,
    pub title: String,
    pub items: Vec<Item>,
    pub tags: BTreeSet<String>,
    pub last_completed_date: Option<DateTime<Utc>>,
    pub auto_reset_enabled: bool,
    /// Only consulted when `auto_reset_enabled` is set.
    pub reset_after_days: Option<u32>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub notes: String,
}

/// Completed and total tick units over a whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }

    fn count(&mut self, items: &[Item]) {
        for item in items {
            if item.is_leaf() {
                self.total += 1;
                if item.is_first_ticked {
                    self.completed += 1;
                }
            } else {
                self.total += 2;
                if item.is_first_ticked {
                    self.completed += 1;
                }
                if item.is_second_ticked == Some(true) {
                    self.completed += 1;
                }
                self.count(&item.children);
            }
        }
    }
}

impl Checklist {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            items: Vec::new(),
            tags: BTreeSet::new(),
            last_completed_date: None,
            auto_reset_enabled: false,
            reset_after_days: None,
            created_date: now,
            modified_date: now,
            notes: String::new(),
        }
    }

    /// Every item at every depth meets its own completion criterion.
    pub fn is_completed(&self) -> bool {
        !self.items.is_empty()
            && self
                .items
                .iter()
                .all(|root| root.walk().all(Item::is_done))
    }

    pub fn progress(&self) -> Progress {
        let mut progress = Progress::default();
        progress.count(&self.items);
        progress
    }

    pub fn completion_percentage(&self) -> f64 {
        self.progress().percentage()
    }

    pub fn mark_completed(&mut self) {
        self.mark_completed_at(Utc::now());
    }

    pub fn mark_completed_at(&mut self, now: DateTime<Utc>) {
        self.last_completed_date = Some(now);
        self.modified_date = now;
    }

    /// Reset days in effect, if auto-reset is on.
    pub fn effective_reset_after_days(&self) -> Option<u32> {
        if self.auto_reset_enabled {
            self.reset_after_days
        } else {
            None
        }
    }

    pub fn should_auto_reset(&self) -> bool {
        self.should_auto_reset_at(Utc::now())
    }

    pub fn should_auto_reset_at(&self, now: DateTime<Utc>) -> bool {
        let (Some(days), Some(last_completed)) =
            (self.effective_reset_after_days(), self.last_completed_date)
        else {
            return false;
        };
        (now - last_completed).num_days() >= i64::from(days)
    }

    /// Enable auto-reset after `days`, or disable it (clearing the days).
    ///
    /// Days outside `RESET_DAYS_RANGE` are rejected and change nothing.
    pub fn set_auto_reset(&mut self, days: Option<u32>) -> Result<()> {
        if let Some(days) = days {
            validate_reset_days(days)?;
        }
        self.auto_reset_enabled = days.is_some();
        self.reset_after_days = days;
        Ok(())
    }

    /// Clear every tick and the completion stamp.
    pub fn reset(&mut self) {
        for item in &mut self.items {
            item.reset();
        }
        self.last_completed_date = None;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.modified_date = Utc::now();
    }

    /// Recompute derived ticks, stamp completion on the first transition to
    /// complete, and bump the modified date.
    pub(crate) fn settle(&mut self) {
        propagate::propagate(&mut self.items);
        if self.is_completed() && self.last_completed_date.is_none() {
            self.mark_completed();
        }
        self.touch();
    }

    pub fn item_count(&self) -> usize {
        self.items.iter().map(Item::subtree_len).sum()
    }

    /// Depth-first search for an item, first match wins.
    pub fn find_item(&self, id: Uuid) -> Option<&Item> {
        self.items
            .iter()
            .flat_map(|root| root.walk())
            .find(|item| item.id == id)
    }

    /// Deep copy with a fresh id, fresh timestamps and pristine ticks.
    ///
    /// Item ids are kept: they only need to be unique within one checklist.
    pub fn duplicate(&self, title: impl Into<String>) -> Self {
        let mut copy = Checklist::new(title);
        copy.items = self.items.clone();
        copy.tags = self.tags.clone();
        copy.auto_reset_enabled = self.auto_reset_enabled;
        copy.reset_after_days = self.reset_after_days;
        copy.prepare_fresh();
        copy
    }

    /// Turn a decoded payload into a new checklist: new id and timestamps,
    /// normalized tree, all ticks cleared.
    pub fn into_imported(self) -> Self {
        let mut imported = Checklist::new(self.title);
        imported.items = self.items;
        imported.tags = self.tags;
        imported.auto_reset_enabled = self.auto_reset_enabled;
        imported.reset_after_days = self.reset_after_days;
        imported.notes = self.notes;
        imported.prepare_fresh();
        imported
    }

    fn prepare_fresh(&mut self) {
        for item in &mut self.items {
            item.normalize_shape();
            item.renumber(None, 0);
        }
        self.reset();
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() {
            return false;
        }
        self.tags.insert(tag.to_string())
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag.trim())
    }
}
