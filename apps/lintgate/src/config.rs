//! Project discovery, rule document loading, and effective settings.
//!
//! lintgate reads `.lintgate.json` from the project root. The root is taken
//! from `--project-root` (or `CLAUDE_PROJECT_DIR`) when given, otherwise it is
//! the closest ancestor of the starting directory that holds the rule
//! document or a `.git` entry.
//!
//! Overrides precedence: CLI flag > environment variable > discovery > defaults.
//! Defaults:
//! - `config`: `.lintgate.json` under the project root
//! - `output`: `human`

use crate::models::rules::Config;
use crate::validate::validate;
use serde_json::Value as Json;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the rule document.
pub const CONFIG_FILE: &str = ".lintgate.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid JSON (line {line}, column {column}): {message}", .path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("{} is invalid: {}", .path.display(), .errors.join("; "))]
    Invalid { path: PathBuf, errors: Vec<String> },
}

impl ConfigError {
    /// Individual messages suitable for one diagnostic each.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ConfigError::Invalid { errors, .. } => errors.clone(),
            other => vec![other.to_string()],
        }
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved settings used by commands after applying precedence.
pub struct Effective {
    pub project_root: PathBuf,
    pub config_path: PathBuf,
    pub output: String,
}

impl Effective {
    /// Whether `file` is the rule document itself.
    pub fn is_config_file(&self, file: &Path) -> bool {
        let file = if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.project_root.join(file)
        };
        same_path(&file, &self.config_path)
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Walk upward from `start` to the project root.
///
/// Stops at the first directory holding `.lintgate.json` or `.git`; falls
/// back to `start` when neither is found.
pub fn detect_project_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if cur.join(CONFIG_FILE).exists() || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Resolve `Effective` from CLI/env values and discovery.
///
/// `start` seeds discovery when no root is given (the hook payload's `cwd`,
/// else the process directory).
pub fn resolve_effective(
    cli_project_root: Option<&Path>,
    cli_config: Option<&Path>,
    cli_output: Option<&str>,
    start: Option<&Path>,
) -> Effective {
    let project_root = match cli_project_root {
        Some(root) => std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf()),
        None => {
            let start = start
                .map(Path::to_path_buf)
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from("."));
            detect_project_root(&start)
        }
    };
    let config_path = match cli_config {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => project_root.join(p),
        None => project_root.join(CONFIG_FILE),
    };
    let output = cli_output.unwrap_or("human").to_string();
    log::debug!(
        "project root {}, config {}",
        project_root.display(),
        config_path.display()
    );
    Effective {
        project_root,
        config_path,
        output,
    }
}

/// Read the rule document as raw JSON.
pub fn load_raw(path: &Path) -> Result<Json, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Syntax {
        path: path.to_path_buf(),
        line: e.line(),
        column: e.column(),
        message: e.to_string(),
    })
}

/// Load and validate the rule document. A missing file is `Ok(None)`;
/// validator warnings are logged.
pub fn load_config(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        log::debug!("no rule document at {}", path.display());
        return Ok(None);
    }
    let raw = load_raw(path)?;
    let report = validate(&raw);
    if !report.is_valid() {
        return Err(ConfigError::Invalid {
            path: path.to_path_buf(),
            errors: report.errors,
        });
    }
    let config: Config = serde_json::from_value(raw).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        errors: vec![e.to_string()],
    })?;
    for w in &report.warnings {
        log::warn!("{}: {}", path.display(), w);
    }
    Ok(Some(config))
}
