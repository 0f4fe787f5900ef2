//! checklists - hierarchical checklists library
//!
//! This library provides the core functionality for the `cl` CLI tool.
//!
//! # Core Concepts
//!
//! - **Items**: Leaves carry one tick; parents carry a derived tick and a
//!   manual "verified" tick
//! - **Propagation**: Parent ticks are recomputed bottom-up after every change
//! - **Auto-reset**: Completed checklists clear themselves after N days
//! - **Document**: Every checklist lives in one JSON file, updated under a lock
//!
//! # Module Organization
//!
//! - `item`, `checklist`: The data model
//! - `propagate`, `mutation`: Tick propagation and tree edits
//! - `document`: The checklist collection, tags, import/export
//! - `codec`: Tolerant JSON decoding with path-carrying errors
//! - `storage`, `store`, `lock`: File persistence and locking
//! - `sweep`: Periodic auto-reset
//! - `cli`, `output`, `config`, `error`: The command-line surface

pub mod checklist;
pub mod cli;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod item;
pub mod lock;
pub mod mutation;
pub mod output;
pub mod propagate;
pub mod storage;
pub mod store;
pub mod sweep;

pub use checklist::{Checklist, Progress};
pub use document::Document;
pub use error::{Error, Result};
pub use item::Item;
pub use propagate::TickMode;
pub use store::{DocumentStore, Persisted};
