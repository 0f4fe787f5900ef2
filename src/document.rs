//! The checklist collection: tag index, lookup, lifecycle and sweep.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::checklist::Checklist;
use crate::codec::{self, DecodeError};
use crate::error::{Error, Result};
use crate::item::{Item, MAX_NESTING_LEVEL};

/// Title suffix appended by `duplicate` unless configured otherwise.
pub const DEFAULT_DUPLICATE_SUFFIX: &str = " (Copy)";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub checklists: Vec<Checklist>,
}

impl Document {
    pub fn from_json(text: &str) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            checklists: codec::decode_document(text)?,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.checklists.is_empty()
    }

    /// Every distinct tag, sorted.
    pub fn all_tags(&self) -> Vec<String> {
        self.checklists
            .iter()
            .flat_map(|checklist| checklist.tags.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn checklists_for_tag(&self, tag: &str) -> Vec<&Checklist> {
        self.checklists
            .iter()
            .filter(|checklist| checklist.tags.contains(tag))
            .collect()
    }

    pub fn checklists_without_tags(&self) -> Vec<&Checklist> {
        self.checklists
            .iter()
            .filter(|checklist| checklist.tags.is_empty())
            .collect()
    }

    /// Every item title used in any checklist, sorted and deduplicated.
    pub fn item_titles(&self) -> Vec<String> {
        self.checklists
            .iter()
            .flat_map(|checklist| checklist.items.iter())
            .flat_map(|root| root.walk())
            .map(|item| item.title.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Result<&Checklist> {
        self.checklists
            .iter()
            .find(|checklist| checklist.id == id)
            .ok_or_else(|| Error::ChecklistNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: Uuid) -> Result<&mut Checklist> {
        self.checklists
            .iter_mut()
            .find(|checklist| checklist.id == id)
            .ok_or_else(|| Error::ChecklistNotFound(id.to_string()))
    }

    /// Append a new empty checklist. Returns its id.
    pub fn create(
        &mut self,
        title: &str,
        tags: &[String],
        reset_after_days: Option<u32>,
    ) -> Result<Uuid> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument(
                "checklist title cannot be empty".to_string(),
            ));
        }
        let mut checklist = Checklist::new(title);
        for tag in tags {
            checklist.add_tag(tag);
        }
        checklist.set_auto_reset(reset_after_days)?;
        let id = checklist.id;
        self.checklists.push(checklist);
        Ok(id)
    }

    pub fn delete(&mut self, id: Uuid) -> Result<Checklist> {
        let index = self
            .checklists
            .iter()
            .position(|checklist| checklist.id == id)
            .ok_or_else(|| Error::ChecklistNotFound(id.to_string()))?;
        Ok(self.checklists.remove(index))
    }

    /// Append a reset copy titled `<title><suffix>`. Returns the copy's id.
    pub fn duplicate(&mut self, id: Uuid, suffix: &str) -> Result<Uuid> {
        let source = self.get(id)?;
        let copy = source.duplicate(format!("{}{}", source.title, suffix));
        let copy_id = copy.id;
        self.checklists.push(copy);
        Ok(copy_id)
    }

    /// Decode a standalone checklist and append it as a new, reset checklist.
    pub fn import_json(&mut self, text: &str) -> Result<Uuid> {
        let imported = codec::decode_checklist(text)?.into_imported();
        if let Some(root) = imported
            .items
            .iter()
            .find(|root| root.height() > MAX_NESTING_LEVEL)
        {
            return Err(Error::NestingTooDeep {
                item: root.id,
                max: MAX_NESTING_LEVEL,
            });
        }
        let id = imported.id;
        self.checklists.push(imported);
        Ok(id)
    }

    pub fn export_json(&self, id: Uuid) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.get(id)?)?)
    }

    /// Reset every checklist whose auto-reset period has elapsed at `now`.
    /// Returns the ids that were reset.
    pub fn sweep_auto_reset(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let mut reset = Vec::new();
        for checklist in &mut self.checklists {
            if checklist.should_auto_reset_at(now) {
                checklist.reset();
                reset.push(checklist.id);
            }
        }
        reset
    }

    /// Find a checklist by full id, exact title, or unique id prefix.
    pub fn resolve_checklist(&self, input: &str) -> Result<Uuid> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument(
                "checklist id cannot be empty".to_string(),
            ));
        }
        if let Ok(id) = Uuid::parse_str(trimmed) {
            if self.checklists.iter().any(|checklist| checklist.id == id) {
                return Ok(id);
            }
        }

        let titled: Vec<Uuid> = self
            .checklists
            .iter()
            .filter(|checklist| checklist.title == trimmed)
            .map(|checklist| checklist.id)
            .collect();
        match titled.as_slice() {
            [id] => return Ok(*id),
            [] => {}
            _ => return Err(ambiguous("checklist", trimmed, &titled)),
        }

        let ids = self.checklists.iter().map(|checklist| checklist.id);
        resolve_prefix(ids, trimmed)
            .map_err(|matches| ambiguous("checklist", trimmed, &matches))?
            .ok_or_else(|| Error::ChecklistNotFound(trimmed.to_string()))
    }

    /// Fill an empty document with the two starter checklists. Returns
    /// whether anything was added.
    pub fn seed_sample_if_empty(&mut self) -> bool {
        if !self.is_empty() {
            return false;
        }
        *self = Self::sample();
        true
    }

    pub fn sample() -> Self {
        fn group(title: &str, children: &[&str]) -> Item {
            Item::with_children(title, children.iter().map(|title| Item::new(*title)).collect())
        }

        let mut packing = Checklist::new("Weekend Trip Packing");
        packing.items = vec![
            group("Clothing", &["2 T-shirts", "1 Pair of jeans", "Underwear", "Socks"]),
            group("Toiletries", &["Toothbrush", "Toothpaste", "Shampoo", "Deodorant"]),
            group("Electronics", &["Phone charger", "Headphones", "Laptop"]),
            Item::new("Passport/ID"),
            Item::new("Wallet"),
            Item::new("Keys"),
        ];
        packing.add_tag("Travel");
        packing.add_tag("Packing");
        packing.auto_reset_enabled = true;
        packing.reset_after_days = Some(7);

        let mut groceries = Checklist::new("Weekly Groceries");
        groceries.items = vec![
            group("Produce", &["Apples", "Bananas", "Lettuce", "Tomatoes"]),
            group("Dairy", &["Milk", "Cheese", "Yogurt"]),
            group("Pantry", &["Bread", "Rice", "Pasta"]),
        ];
        groceries.add_tag("Shopping");
        groceries.add_tag("Weekly");
        groceries.auto_reset_enabled = true;
        groceries.reset_after_days = Some(7);

        Self {
            checklists: vec![packing, groceries],
        }
    }
}

impl Checklist {
    /// Find an item by full id, unique exact title, or unique id prefix.
    pub fn resolve_item(&self, input: &str) -> Result<Uuid> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidArgument("item id cannot be empty".to_string()));
        }
        if let Ok(id) = Uuid::parse_str(trimmed) {
            return self
                .find_item(id)
                .map(|item| item.id)
                .ok_or_else(|| Error::ItemNotFound(id.to_string()));
        }

        let all = || self.items.iter().flat_map(|root| root.walk());
        let titled: Vec<Uuid> = all()
            .filter(|item| item.title == trimmed)
            .map(|item| item.id)
            .collect();
        match titled.as_slice() {
            [id] => return Ok(*id),
            [] => {}
            _ => return Err(ambiguous("item", trimmed, &titled)),
        }

        resolve_prefix(all().map(|item| item.id), trimmed)
            .map_err(|matches| ambiguous("item", trimmed, &matches))?
            .ok_or_else(|| Error::ItemNotFound(trimmed.to_string()))
    }
}

/// `Ok(None)` when nothing matches, `Err(matches)` when several do.
fn resolve_prefix(
    ids: impl Iterator<Item = Uuid>,
    prefix: &str,
) -> std::result::Result<Option<Uuid>, Vec<Uuid>> {
    let prefix = prefix.to_ascii_lowercase();
    let mut matches: Vec<Uuid> = ids
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();
    matches.sort();
    matches.dedup();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => Err(matches),
    }
}

fn ambiguous(what: &str, input: &str, matches: &[Uuid]) -> Error {
    let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
    Error::InvalidArgument(format!(
        "ambiguous {what} '{input}': {}",
        ids.join(", ")
    ))
}
