//! Command-line interface for checklists
//!
//! This module defines the CLI structure using clap derive macros.
//! Checklist commands live in `checklist`, item commands in `item` and the
//! auto-reset commands in `sweep`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::checklist::validate_reset_days;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputOptions;
use crate::storage::Storage;
use crate::store::DocumentStore;

mod checklist;
mod item;
mod sweep;

/// cl - hierarchical checklists
///
/// Checklists are trees of items. Leaves take one tick; parents take a
/// derived tick plus a manual "verified" tick. Completed checklists can reset
/// themselves after a number of days.
#[derive(Parser, Debug)]
#[command(name = "cl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the checklist document
    #[arg(long, global = true, env = "CL_DATA")]
    pub data: Option<PathBuf>,

    /// Path to checklists.toml (defaults to the platform config directory)
    #[arg(long, global = true, env = "CL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the document file, optionally with starter checklists
    Init {
        /// Seed the two starter checklists if the document is empty
        #[arg(long)]
        sample: bool,
    },

    /// Create a checklist
    New {
        title: String,

        #[command(flatten)]
        meta: MetaArgs,
    },

    /// List checklists
    List {
        /// Only checklists carrying this tag
        #[arg(long, conflicts_with = "untagged")]
        tag: Option<String>,

        /// Only checklists without tags
        #[arg(long)]
        untagged: bool,
    },

    /// Show a checklist as a tree
    Show {
        /// Checklist id, id prefix or title
        checklist: String,

        /// Include items hidden under folded parents
        #[arg(long)]
        all: bool,

        /// Print item ids
        #[arg(long)]
        ids: bool,
    },

    /// Edit checklist title, tags, notes or auto-reset
    Edit {
        /// Checklist id, id prefix or title
        checklist: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Remove a tag (repeatable)
        #[arg(long = "untag", value_name = "TAG")]
        untag: Vec<String>,

        /// Remove all tags before adding new ones
        #[arg(long)]
        clear_tags: bool,

        /// Replace the notes
        #[arg(long)]
        notes: Option<String>,

        /// Turn auto-reset off
        #[arg(long, conflicts_with_all = ["auto_reset", "reset_days"])]
        no_auto_reset: bool,

        #[command(flatten)]
        meta: MetaArgs,
    },

    /// Delete a checklist
    Rm {
        /// Checklist id, id prefix or title
        checklist: String,
    },

    /// Duplicate a checklist with all ticks cleared
    Dup {
        /// Checklist id, id prefix or title
        checklist: String,
    },

    /// Clear every tick in a checklist
    Reset {
        /// Checklist id, id prefix or title
        checklist: String,
    },

    /// Print a checklist as standalone JSON
    Export {
        /// Checklist id, id prefix or title
        checklist: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Import a checklist exported as JSON
    Import {
        /// File to read; stdin when omitted or "-"
        file: Option<PathBuf>,
    },

    /// List tags with their checklist counts
    Tags,

    /// List every item title in use, for suggestions
    Titles {
        /// Only titles containing this text (case-insensitive)
        #[arg(long)]
        matching: Option<String>,
    },

    /// Item operations
    #[command(subcommand)]
    Item(ItemCommands),

    /// Reset every checklist whose auto-reset period has elapsed
    Sweep,

    /// Sweep periodically until interrupted
    Watch {
        /// Sweep period, e.g. "30m" (defaults to auto_reset.sweep_interval)
        #[arg(long)]
        interval: Option<String>,

        /// Stop after this many sweeps
        #[arg(long)]
        ticks: Option<u64>,
    },
}

/// Checklist metadata shared by `new` and `edit`
#[derive(Args, Debug, Clone, Default)]
pub struct MetaArgs {
    /// Add a tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Enable auto-reset with the configured default period
    #[arg(long)]
    pub auto_reset: bool,

    /// Enable auto-reset after this many days
    #[arg(long, value_name = "DAYS")]
    pub reset_days: Option<u32>,
}

/// Item subcommands
#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Add an item at the end of the root list or of a parent's children
    Add {
        checklist: String,
        title: String,

        /// Parent item id, id prefix or title
        #[arg(long)]
        parent: Option<String>,
    },

    /// Delete an item and everything under it
    Rm { checklist: String, item: String },

    /// Move an item (with its children) under another item or to the root
    Mv {
        checklist: String,
        item: String,

        /// New parent item
        #[arg(long, required_unless_present = "root", conflicts_with = "root")]
        under: Option<String>,

        /// Move to the end of the root list
        #[arg(long)]
        root: bool,
    },

    /// Rename an item
    Rename {
        checklist: String,
        item: String,
        title: String,
    },

    /// Toggle an item's tick; on a parent the new value cascades down
    Tick {
        checklist: String,
        item: String,

        /// Flip only the item and let its parents recompute
        #[arg(long)]
        derived: bool,
    },

    /// Toggle a parent's verified tick
    Verify { checklist: String, item: String },

    /// Fold or unfold a parent in `show`
    Fold { checklist: String, item: String },
}

/// Flags every command sees
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub data: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }
}

/// Loaded configuration and the document store it points at
pub(crate) struct Context {
    pub config: Config,
    pub store: DocumentStore,
    pub output: OutputOptions,
}

impl Context {
    pub fn load(global: &GlobalOptions) -> Result<Self> {
        let config = match &global.config {
            Some(path) if !path.exists() => {
                return Err(Error::InvalidConfig(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => Config::load(path)?,
            None => Config::default_path()
                .map(|path| Config::load_or_default(&path))
                .unwrap_or_default(),
        };
        let data_file = config.data_file(global.data.as_deref());
        tracing::debug!(data_file = %data_file.display(), "using document");
        let store = DocumentStore::new(Storage::new(data_file), config.lock_timeout_ms);
        Ok(Self {
            config,
            store,
            output: global.output(),
        })
    }

    /// Auto-reset days requested by `--auto-reset` / `--reset-days`.
    pub fn requested_reset_days(&self, meta: &MetaArgs) -> Result<Option<u32>> {
        match (meta.reset_days, meta.auto_reset) {
            (Some(days), _) => validate_reset_days(days).map(Some),
            (None, true) => Ok(Some(self.config.auto_reset.default_reset_after_days)),
            (None, false) => Ok(None),
        }
    }
}

impl Cli {
    fn global(&self) -> GlobalOptions {
        GlobalOptions {
            data: self.data.clone(),
            config: self.config.clone(),
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = self.global();
        match self.command {
            Commands::Init { sample } => checklist::run_init(checklist::InitOptions { sample, global }),
            Commands::New { title, meta } => {
                checklist::run_new(checklist::NewOptions { title, meta, global })
            }
            Commands::List { tag, untagged } => checklist::run_list(checklist::ListOptions {
                tag,
                untagged,
                global,
            }),
            Commands::Show { checklist, all, ids } => checklist::run_show(checklist::ShowOptions {
                checklist,
                all,
                ids,
                global,
            }),
            Commands::Edit {
                checklist,
                title,
                untag,
                clear_tags,
                notes,
                no_auto_reset,
                meta,
            } => checklist::run_edit(checklist::EditOptions {
                checklist,
                title,
                untag,
                clear_tags,
                notes,
                no_auto_reset,
                meta,
                global,
            }),
            Commands::Rm { checklist } => {
                checklist::run_rm(checklist::TargetOptions { checklist, global })
            }
            Commands::Dup { checklist } => {
                checklist::run_dup(checklist::TargetOptions { checklist, global })
            }
            Commands::Reset { checklist } => {
                checklist::run_reset(checklist::TargetOptions { checklist, global })
            }
            Commands::Export { checklist, out } => {
                checklist::run_export(checklist::ExportOptions {
                    checklist,
                    out,
                    global,
                })
            }
            Commands::Import { file } => {
                checklist::run_import(checklist::ImportOptions { file, global })
            }
            Commands::Tags => checklist::run_tags(global),
            Commands::Titles { matching } => {
                checklist::run_titles(checklist::TitlesOptions { matching, global })
            }
            Commands::Item(cmd) => item::run(cmd, global),
            Commands::Sweep => sweep::run_sweep(global),
            Commands::Watch { interval, ticks } => sweep::run_watch(sweep::WatchOptions {
                interval,
                ticks,
                global,
            }),
        }
    }
}
