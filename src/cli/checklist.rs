//! Checklist-level command implementations.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Context, GlobalOptions, MetaArgs};
use crate::checklist::{Checklist, Progress};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock;
use crate::mutation::FlatItem;
use crate::output::{emit_raw, emit_success, HumanOutput};

pub struct InitOptions {
    pub sample: bool,
    pub global: GlobalOptions,
}

pub struct NewOptions {
    pub title: String,
    pub meta: MetaArgs,
    pub global: GlobalOptions,
}

pub struct ListOptions {
    pub tag: Option<String>,
    pub untagged: bool,
    pub global: GlobalOptions,
}

pub struct ShowOptions {
    pub checklist: String,
    pub all: bool,
    pub ids: bool,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub checklist: String,
    pub title: Option<String>,
    pub untag: Vec<String>,
    pub clear_tags: bool,
    pub notes: Option<String>,
    pub no_auto_reset: bool,
    pub meta: MetaArgs,
    pub global: GlobalOptions,
}

/// Commands that only name a checklist
pub struct TargetOptions {
    pub checklist: String,
    pub global: GlobalOptions,
}

pub struct ExportOptions {
    pub checklist: String,
    pub out: Option<PathBuf>,
    pub global: GlobalOptions,
}

pub struct ImportOptions {
    pub file: Option<PathBuf>,
    pub global: GlobalOptions,
}

pub struct TitlesOptions {
    pub matching: Option<String>,
    pub global: GlobalOptions,
}

/// One checklist as listed
#[derive(Serialize)]
pub(crate) struct ChecklistSummary {
    id: Uuid,
    title: String,
    tags: Vec<String>,
    items: usize,
    progress: Progress,
    percentage: f64,
    completed: bool,
    reset_after_days: Option<u32>,
    last_completed_date: Option<DateTime<Utc>>,
}

impl ChecklistSummary {
    pub(crate) fn of(checklist: &Checklist) -> Self {
        let progress = checklist.progress();
        Self {
            id: checklist.id,
            title: checklist.title.clone(),
            tags: checklist.tags.iter().cloned().collect(),
            items: checklist.item_count(),
            progress,
            percentage: progress.percentage(),
            completed: checklist.is_completed(),
            reset_after_days: checklist.effective_reset_after_days(),
            last_completed_date: checklist.last_completed_date,
        }
    }

    fn line(&self) -> String {
        let mut line = format!(
            "{} {} [{}]",
            short_id(&self.id),
            self.title,
            format_progress(&self.progress)
        );
        if self.completed {
            line.push_str(" done");
        }
        if !self.tags.is_empty() {
            line.push_str(&format!(" #{}", self.tags.join(" #")));
        }
        line
    }
}

#[derive(Serialize)]
struct InitOutput {
    data_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    config_written: Option<PathBuf>,
    created: bool,
    seeded: bool,
    checklists: usize,
}

#[derive(Serialize)]
struct ListOutput {
    total: usize,
    checklists: Vec<ChecklistSummary>,
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    #[serde(flatten)]
    summary: ChecklistSummary,
    checklist: &'a Checklist,
}

#[derive(Serialize)]
struct ChangeOutput {
    id: Uuid,
    title: String,
    changed: bool,
}

#[derive(Serialize)]
struct TagCount {
    tag: String,
    checklists: usize,
}

#[derive(Serialize)]
struct TagsOutput {
    tags: Vec<TagCount>,
    untagged: usize,
}

#[derive(Serialize)]
struct TitlesOutput {
    titles: Vec<String>,
}

pub(crate) fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

pub(crate) fn format_progress(progress: &Progress) -> String {
    format!(
        "{:.0}% {}/{}",
        progress.percentage(),
        progress.completed,
        progress.total
    )
}

fn resolve_meta_tags(meta: &MetaArgs) -> Vec<String> {
    meta.tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Write a default `checklists.toml` at `path` unless one is there.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    Config::default().save(path)?;
    tracing::info!(path = %path.display(), "wrote default config");
    Ok(true)
}

pub fn run_init(options: InitOptions) -> Result<()> {
    let config_path = options.global.config.clone().or_else(Config::default_path);
    let mut config_warning = None;
    let config_written = match config_path {
        Some(path) => match write_default_config(&path) {
            Ok(true) => Some(path),
            Ok(false) => None,
            Err(err) => {
                config_warning = Some(format!("config not written: {err}"));
                None
            }
        },
        None => None,
    };

    let ctx = Context::load(&options.global)?;
    let existed = ctx.store.storage().exists();
    let sample = options.sample;
    let outcome = ctx.store.update(|document| {
        let seeded = sample && document.seed_sample_if_empty();
        Ok((seeded, document.checklists.len()))
    })?;
    let (seeded, count) = outcome.value;

    let output = InitOutput {
        data_file: ctx.store.storage().data_file().to_path_buf(),
        config_written,
        created: !existed,
        seeded,
        checklists: count,
    };
    let mut human = HumanOutput::new(if existed {
        "Document already initialized"
    } else {
        "Document created"
    });
    human.push_summary("Data file", output.data_file.display().to_string());
    if let Some(path) = &output.config_written {
        human.push_summary("Config", path.display().to_string());
    }
    human.push_summary("Checklists", count.to_string());
    if seeded {
        human.push_detail("added starter checklists");
    } else if sample {
        human.push_detail("document not empty, starter checklists skipped");
    }
    human.push_warning_opt(config_warning.as_deref());
    human.push_warning_opt(outcome.warning.as_deref());
    human.push_next_step("cl list");
    emit_success(ctx.output, "init", &output, Some(&human))
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let reset_days = ctx.requested_reset_days(&options.meta)?;
    let tags = resolve_meta_tags(&options.meta);
    let title = options.title;

    let outcome = ctx.store.update(|document| {
        let id = document.create(&title, &tags, reset_days)?;
        document.get(id).map(ChecklistSummary::of)
    })?;
    let summary = outcome.value;

    let mut human = HumanOutput::new("Checklist created");
    human.push_summary("ID", summary.id.to_string());
    human.push_summary("Title", summary.title.clone());
    if !summary.tags.is_empty() {
        human.push_summary("Tags", summary.tags.join(", "));
    }
    if let Some(days) = summary.reset_after_days {
        human.push_summary("Auto-reset", format!("after {days} days"));
    }
    human.push_warning_opt(outcome.warning.as_deref());
    human.push_next_step(format!("cl item add {} \"<title>\"", short_id(&summary.id)));
    emit_success(ctx.output, "new", &summary, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let document = ctx.store.snapshot();

    let selected: Vec<&Checklist> = match (&options.tag, options.untagged) {
        (Some(tag), _) => document.checklists_for_tag(tag.trim()),
        (None, true) => document.checklists_without_tags(),
        (None, false) => document.checklists.iter().collect(),
    };
    let output = ListOutput {
        total: selected.len(),
        checklists: selected.into_iter().map(ChecklistSummary::of).collect(),
    };

    let mut human = HumanOutput::new("Checklists");
    human.push_summary("Total", output.total.to_string());
    for summary in &output.checklists {
        human.push_detail(summary.line());
    }
    if document.is_empty() {
        human.push_next_step("cl init --sample");
    }
    emit_success(ctx.output, "list", &output, Some(&human))
}

fn render_row(row: &FlatItem<'_>, ids: bool) -> String {
    let item = row.item;
    let indent = "  ".repeat(item.nesting_level as usize);
    let tick = |on: bool| if on { "[x]" } else { "[ ]" };
    let mut line = match item.is_second_ticked {
        None => format!("{indent}{} {}", tick(item.is_first_ticked), item.title),
        Some(verified) => format!(
            "{indent}{}{} {}",
            tick(item.is_first_ticked),
            tick(verified),
            item.title
        ),
    };
    if !item.is_leaf() && !item.is_expanded {
        line.push_str(&format!(" (+{} folded)", item.subtree_len() - 1));
    }
    if ids {
        line.push_str(&format!("  {}", short_id(&item.id)));
    }
    line
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let document = ctx.store.snapshot();
    let id = document.resolve_checklist(&options.checklist)?;
    let checklist = document.get(id)?;

    let mut human = HumanOutput::new(checklist.title.clone());
    for row in checklist.flattened() {
        if row.visible || options.all {
            human.push_line(render_row(&row, options.ids));
        }
    }
    let summary = ChecklistSummary::of(checklist);
    human.push_summary("ID", checklist.id.to_string());
    human.push_summary("Progress", format_progress(&summary.progress));
    if !summary.tags.is_empty() {
        human.push_summary("Tags", summary.tags.join(", "));
    }
    if let Some(days) = summary.reset_after_days {
        human.push_summary("Auto-reset", format!("after {days} days"));
    }
    if let Some(date) = summary.last_completed_date {
        human.push_summary("Last completed", date.to_rfc3339());
    }
    if !checklist.notes.is_empty() {
        human.push_detail(checklist.notes.clone());
    }

    let output = ShowOutput { summary, checklist };
    emit_success(ctx.output, "show", &output, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let requested_days = ctx.requested_reset_days(&options.meta)?;
    let add_tags = resolve_meta_tags(&options.meta);

    let outcome = ctx.store.update(|document| {
        let id = document.resolve_checklist(&options.checklist)?;
        let checklist = document.get_mut(id)?;
        let mut changed = false;

        if let Some(title) = &options.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(Error::InvalidArgument(
                    "checklist title cannot be empty".to_string(),
                ));
            }
            if checklist.title != title {
                checklist.title = title.to_string();
                changed = true;
            }
        }
        if options.clear_tags && !checklist.tags.is_empty() {
            checklist.tags = BTreeSet::new();
            changed = true;
        }
        for tag in &options.untag {
            changed |= checklist.remove_tag(tag);
        }
        for tag in &add_tags {
            changed |= checklist.add_tag(tag);
        }
        if let Some(notes) = &options.notes {
            if &checklist.notes != notes {
                checklist.notes = notes.clone();
                changed = true;
            }
        }
        let reset_policy = if options.no_auto_reset {
            Some(None)
        } else {
            requested_days.map(Some)
        };
        if let Some(days) = reset_policy {
            if checklist.effective_reset_after_days() != days
                || checklist.auto_reset_enabled != days.is_some()
            {
                checklist.set_auto_reset(days)?;
                changed = true;
            }
        }

        if changed {
            checklist.touch();
        }
        Ok(ChangeOutput {
            id,
            title: checklist.title.clone(),
            changed,
        })
    })?;
    let output = outcome.value;

    let mut human = HumanOutput::new(if output.changed {
        "Checklist updated"
    } else {
        "No checklist changes"
    });
    human.push_summary("ID", output.id.to_string());
    human.push_summary("Title", output.title.clone());
    human.push_warning_opt(outcome.warning.as_deref());
    emit_success(ctx.output, "edit", &output, Some(&human))
}

pub fn run_rm(options: TargetOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let outcome = ctx.store.update(|document| {
        let id = document.resolve_checklist(&options.checklist)?;
        document.delete(id).map(|removed| ChecklistSummary::of(&removed))
    })?;
    let summary = outcome.value;

    let mut human = HumanOutput::new("Checklist deleted");
    human.push_summary("ID", summary.id.to_string());
    human.push_summary("Title", summary.title.clone());
    human.push_summary("Items", summary.items.to_string());
    human.push_warning_opt(outcome.warning.as_deref());
    emit_success(ctx.output, "rm", &summary, Some(&human))
}

pub fn run_dup(options: TargetOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let suffix = ctx.config.checklists.duplicate_suffix.clone();
    let outcome = ctx.store.update(|document| {
        let source = document.resolve_checklist(&options.checklist)?;
        let copy = document.duplicate(source, &suffix)?;
        document.get(copy).map(ChecklistSummary::of)
    })?;
    let summary = outcome.value;

    let mut human = HumanOutput::new("Checklist duplicated");
    human.push_summary("ID", summary.id.to_string());
    human.push_summary("Title", summary.title.clone());
    human.push_summary("Items", summary.items.to_string());
    human.push_warning_opt(outcome.warning.as_deref());
    emit_success(ctx.output, "dup", &summary, Some(&human))
}

pub fn run_reset(options: TargetOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let outcome = ctx.store.update(|document| {
        let id = document.resolve_checklist(&options.checklist)?;
        let checklist = document.get_mut(id)?;
        checklist.reset();
        Ok(ChecklistSummary::of(checklist))
    })?;
    let summary = outcome.value;

    let mut human = HumanOutput::new("Checklist reset");
    human.push_summary("Title", summary.title.clone());
    human.push_summary("Progress", format_progress(&summary.progress));
    human.push_warning_opt(outcome.warning.as_deref());
    emit_success(ctx.output, "reset", &summary, Some(&human))
}

pub fn run_export(options: ExportOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let document = ctx.store.snapshot();
    let id = document.resolve_checklist(&options.checklist)?;
    let text = document.export_json(id)?;

    let Some(out) = options.out else {
        return emit_raw(ctx.output, "export", &text);
    };
    lock::write_atomic(&out, text.as_bytes())?;

    #[derive(Serialize)]
    struct ExportOutput {
        id: Uuid,
        path: PathBuf,
    }
    let mut human = HumanOutput::new("Checklist exported");
    human.push_summary("Path", out.display().to_string());
    emit_success(ctx.output, "export", &ExportOutput { id, path: out }, Some(&human))
}

pub fn run_import(options: ImportOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let text = match options.file.as_deref() {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)?,
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let outcome = ctx.store.update(|document| {
        let id = document.import_json(&text)?;
        document.get(id).map(ChecklistSummary::of)
    })?;
    let summary = outcome.value;

    let mut human = HumanOutput::new("Checklist imported");
    human.push_summary("ID", summary.id.to_string());
    human.push_summary("Title", summary.title.clone());
    human.push_summary("Items", summary.items.to_string());
    human.push_warning_opt(outcome.warning.as_deref());
    human.push_next_step(format!("cl show {}", short_id(&summary.id)));
    emit_success(ctx.output, "import", &summary, Some(&human))
}

pub fn run_tags(global: GlobalOptions) -> Result<()> {
    let ctx = Context::load(&global)?;
    let document = ctx.store.snapshot();
    let output = TagsOutput {
        tags: document
            .all_tags()
            .into_iter()
            .map(|tag| TagCount {
                checklists: document.checklists_for_tag(&tag).len(),
                tag,
            })
            .collect(),
        untagged: document.checklists_without_tags().len(),
    };

    let mut human = HumanOutput::new("Tags");
    for tag in &output.tags {
        human.push_summary(tag.tag.clone(), tag.checklists.to_string());
    }
    human.push_summary("(untagged)", output.untagged.to_string());
    emit_success(ctx.output, "tags", &output, Some(&human))
}

pub fn run_titles(options: TitlesOptions) -> Result<()> {
    let ctx = Context::load(&options.global)?;
    let needle = options
        .matching
        .as_deref()
        .map(|text| text.trim().to_lowercase());
    let titles: Vec<String> = ctx
        .store
        .snapshot()
        .item_titles()
        .into_iter()
        .filter(|title| {
            needle
                .as_deref()
                .map_or(true, |needle| title.to_lowercase().contains(needle))
        })
        .collect();

    let mut human = HumanOutput::new("Item titles");
    for title in &titles {
        human.push_detail(title.clone());
    }
    emit_success(ctx.output, "titles", &TitlesOutput { titles }, Some(&human))
}
