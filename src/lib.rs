//! sortdir - move files into subfolders by type or by date
//!
//! This library classifies files by extension against an ordered rule set,
//! moves them into category or date folders without ever overwriting an
//! existing file, and supports dry runs that leave the filesystem untouched.
//! A run can also be handed to a background worker for interactive
//! front-ends. With the `server` feature it additionally ships the small
//! contact-form web service.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod run;
pub mod worker;

#[cfg(feature = "server")]
pub mod contacts;

pub use config::{ConfigError, DateAttribute, DateFormat};
pub use file_category::{Category, RuleSet, classify};
pub use file_organizer::{MoveAction, Mover, OrganizeError, OrganizeResult, safe_move};
pub use run::{OrganizeMode, OrganizerRun, RunReport, organize_by_date, organize_by_type};
pub use worker::{RunWorker, WorkerStatus};

pub use cli::{Cli, run_cli};
