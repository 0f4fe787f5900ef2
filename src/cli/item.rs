//! Item command implementations.
//!
//! Every command resolves its checklist and item inside the locked update,
//! so addressing and mutation see the same document.

use serde::Serialize;
use uuid::Uuid;

use super::checklist::{format_progress, short_id};
use super::{Context, GlobalOptions, ItemCommands};
use crate::checklist::{Checklist, Progress};
use crate::document::Document;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::propagate::TickMode;

#[derive(Serialize)]
struct ItemOutput {
    checklist: Uuid,
    item: Uuid,
    title: String,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_ticked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    second_ticked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expanded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    removed: Option<usize>,
    progress: Progress,
    completed: bool,
}

impl ItemOutput {
    fn new(checklist: &Checklist, item: Uuid, title: String) -> Self {
        Self {
            checklist: checklist.id,
            item,
            title,
            changed: true,
            first_ticked: None,
            second_ticked: None,
            expanded: None,
            removed: None,
            progress: checklist.progress(),
            completed: checklist.is_completed(),
        }
    }

    /// Build from the item's current state after a mutation.
    fn current(checklist: &Checklist, item: Uuid) -> Self {
        let title = checklist
            .find_item(item)
            .map(|found| found.title.clone())
            .unwrap_or_default();
        Self::new(checklist, item, title)
    }
}

fn resolve<'a>(
    document: &'a mut Document,
    checklist: &str,
    item: &str,
) -> Result<(&'a mut Checklist, Uuid)> {
    let id = document.resolve_checklist(checklist)?;
    let checklist = document.get_mut(id)?;
    let item = checklist.resolve_item(item)?;
    Ok((checklist, item))
}

fn resolve_checklist<'a>(document: &'a mut Document, checklist: &str) -> Result<&'a mut Checklist> {
    let id = document.resolve_checklist(checklist)?;
    document.get_mut(id)
}

pub fn run(cmd: ItemCommands, global: GlobalOptions) -> Result<()> {
    let ctx = Context::load(&global)?;

    let (command, header, outcome) = match cmd {
        ItemCommands::Add {
            checklist,
            title,
            parent,
        } => {
            let outcome = ctx.store.update(|document| {
                let checklist = resolve_checklist(document, &checklist)?;
                let parent = parent
                    .as_deref()
                    .map(|parent| checklist.resolve_item(parent))
                    .transpose()?;
                let id = checklist.add_item(&title, parent)?;
                Ok(ItemOutput::current(checklist, id))
            })?;
            ("item add", "Item added", outcome)
        }
        ItemCommands::Rm { checklist, item } => {
            let outcome = ctx.store.update(|document| {
                let (checklist, item) = resolve(document, &checklist, &item)?;
                let removed = checklist.delete_item(item)?;
                let mut output = ItemOutput::new(checklist, item, removed.title.clone());
                output.removed = Some(removed.subtree_len());
                Ok(output)
            })?;
            ("item rm", "Item deleted", outcome)
        }
        ItemCommands::Mv {
            checklist,
            item,
            under,
            root: _,
        } => {
            let outcome = ctx.store.update(|document| {
                let (checklist, item) = resolve(document, &checklist, &item)?;
                let parent = under
                    .as_deref()
                    .map(|parent| checklist.resolve_item(parent))
                    .transpose()?;
                checklist.move_item(item, parent)?;
                Ok(ItemOutput::current(checklist, item))
            })?;
            ("item mv", "Item moved", outcome)
        }
        ItemCommands::Rename {
            checklist,
            item,
            title,
        } => {
            let outcome = ctx.store.update(|document| {
                let (checklist, item) = resolve(document, &checklist, &item)?;
                let changed = checklist.rename_item(item, &title)?;
                let mut output = ItemOutput::current(checklist, item);
                output.changed = changed;
                Ok(output)
            })?;
            ("item rename", "Item renamed", outcome)
        }
        ItemCommands::Tick {
            checklist,
            item,
            derived,
        } => {
            let mode = if derived {
                TickMode::Derived
            } else {
                TickMode::Manual
            };
            let outcome = ctx.store.update(|document| {
                let (checklist, item) = resolve(document, &checklist, &item)?;
                let ticked = checklist.toggle_first_tick(item, mode)?;
                let mut output = ItemOutput::current(checklist, item);
                output.first_ticked = Some(ticked);
                Ok(output)
            })?;
            ("item tick", "Item toggled", outcome)
        }
        ItemCommands::Verify { checklist, item } => {
            let outcome = ctx.store.update(|document| {
                let (checklist, item) = resolve(document, &checklist, &item)?;
                let verified = checklist.toggle_second_tick(item)?;
                let mut output = ItemOutput::current(checklist, item);
                output.changed = verified.is_some();
                output.second_ticked = verified;
                Ok(output)
            })?;
            ("item verify", "Item verification toggled", outcome)
        }
        ItemCommands::Fold { checklist, item } => {
            let outcome = ctx.store.update(|document| {
                let (checklist, item) = resolve(document, &checklist, &item)?;
                let expanded = checklist.toggle_expanded(item)?;
                let mut output = ItemOutput::current(checklist, item);
                output.expanded = Some(expanded);
                Ok(output)
            })?;
            ("item fold", "Item fold toggled", outcome)
        }
    };

    let output = &outcome.value;
    let mut human = HumanOutput::new(if output.changed {
        header
    } else {
        "No item changes"
    });
    human.push_summary("Item", format!("{} {}", short_id(&output.item), output.title));
    if let Some(ticked) = output.first_ticked {
        human.push_summary("Ticked", ticked.to_string());
    }
    if let Some(verified) = output.second_ticked {
        human.push_summary("Verified", verified.to_string());
    }
    if let Some(expanded) = output.expanded {
        human.push_summary("Expanded", expanded.to_string());
    }
    if let Some(removed) = output.removed {
        human.push_summary("Removed", format!("{removed} item(s)"));
    }
    if !output.changed && command == "item verify" {
        human.push_detail("leaf items have no verification tick");
    }
    human.push_summary("Progress", format_progress(&output.progress));
    if output.completed {
        human.push_detail("checklist complete");
    }
    human.push_warning_opt(outcome.warning.as_deref());
    emit_success(ctx.output, command, output, Some(&human))
}
