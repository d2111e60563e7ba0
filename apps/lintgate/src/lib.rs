//! lintgate core library.
//!
//! This crate exposes the programmatic APIs behind the `lintgate` hook: given
//! an edited file it decides which external checks apply, runs them, and
//! normalizes their output; given a finished sub-task it picks a routing
//! action.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Project discovery, rule document loading, effective settings.
//! - `models`: Diagnostics, check reports, and the rule document schema.
//! - `pattern`: Exclude globs and environment path prefixes.
//! - `resolve`: Environment resolution for a file path.
//! - `parsers`: Built-in and regex output parsers.
//! - `executor`: Running checks through a `CommandRunner`.
//! - `tasks`: Sub-agent routing rules.
//! - `validate`: Structural validation of the rule document.
//! - `git`: In-progress repository operation detection.
//! - `gate`: Event dispatch into continue/block outcomes.
//! - `hook`: Hook payload and response wire types.
//! - `refresh`: Merging auto-discovered checks.
//! - `output`: Human/JSON printers and block reason text.
pub mod cli;
pub mod config;
pub mod executor;
pub mod gate;
pub mod git;
pub mod hook;
pub mod models;
pub mod output;
pub mod parsers;
pub mod pattern;
pub mod refresh;
pub mod resolve;
pub mod tasks;
pub mod validate;
