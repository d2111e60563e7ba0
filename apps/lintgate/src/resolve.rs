//! Environment resolution: which checks apply to an edited file.
//!
//! Environments are scanned in declaration order and the first one covering
//! the file is authoritative. Two asymmetries matter for monorepos:
//! - An exclude hit stops the scan only when that environment has checks for
//!   the file's extension; otherwise scanning continues.
//! - A covering, non-excluded environment without checks for the extension
//!   stops the scan with `no-checks-for-extension`.

use crate::models::rules::{Check, Config};
use crate::pattern::{first_exclude, path_under_any};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
/// Why a resolution produced (or did not produce) checks.
pub enum Reason {
    Ok,
    PathExcluded { environment: String, pattern: String },
    NoChecksForExtension { environment: String },
    NoMatchingEnvironment,
    NoConfig,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Ok => "ok",
            Reason::PathExcluded { .. } => "path-excluded",
            Reason::NoChecksForExtension { .. } => "no-checks-for-extension",
            Reason::NoMatchingEnvironment => "no-matching-environment",
            Reason::NoConfig => "no-config",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::PathExcluded {
                environment,
                pattern,
            } => write!(f, "path-excluded by '{}' in {}", pattern, environment),
            Reason::NoChecksForExtension { environment } => {
                write!(f, "no-checks-for-extension in {}", environment)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
/// Result of resolving one file against the rule document.
pub struct Resolution<'a> {
    pub checks: &'a [Check],
    pub reason: Reason,
    /// Label of the environment that decided the outcome.
    pub environment: Option<String>,
    /// Delegate agent configured for the extension, if any.
    pub agent: Option<&'a str>,
    /// Directory the checks run in.
    pub working_dir: PathBuf,
    /// Posix-style path of the file relative to the project root.
    pub relative_path: String,
}

impl<'a> Resolution<'a> {
    fn empty(reason: Reason, project_root: &Path, relative_path: String) -> Self {
        Self {
            checks: &[],
            reason,
            environment: None,
            agent: None,
            working_dir: project_root.to_path_buf(),
            relative_path,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.reason == Reason::Ok
    }
}

/// Resolve which checks apply to `file_path`.
pub fn resolve<'a>(
    config: Option<&'a Config>,
    file_path: &Path,
    project_root: &Path,
) -> Resolution<'a> {
    let relative = relative_path(file_path, project_root);
    let Some(config) = config else {
        return Resolution::empty(Reason::NoConfig, project_root, relative);
    };
    let ext = extension(file_path);

    for (i, env) in config.environments.iter().enumerate() {
        if env.paths.is_empty() || !path_under_any(&relative, &env.paths) {
            continue;
        }
        let label = env.label(i);
        let checks = env.checks_for(&ext);

        if let Some(pattern) = first_exclude(&relative, &env.excludes) {
            if checks.is_some() {
                log::debug!("{} excluded by '{}' in {}", relative, pattern, label);
                let mut r = Resolution::empty(
                    Reason::PathExcluded {
                        environment: label.clone(),
                        pattern: pattern.to_string(),
                    },
                    project_root,
                    relative,
                );
                r.environment = Some(label);
                return r;
            }
            log::debug!(
                "{} excluded in {} which has no '{}' checks; continuing",
                relative,
                label,
                ext
            );
            continue;
        }

        let working_dir = match env.root.as_deref() {
            Some(root) if !root.is_empty() && root != "." => project_root.join(root),
            _ => project_root.to_path_buf(),
        };
        let agent = env.agent_for(&ext).map(String::as_str);
        return match checks {
            Some(checks) => {
                log::debug!("{} -> {} ({} checks)", relative, label, checks.len());
                Resolution {
                    checks: checks.as_slice(),
                    reason: Reason::Ok,
                    environment: Some(label),
                    agent,
                    working_dir,
                    relative_path: relative,
                }
            }
            None => Resolution {
                checks: &[],
                reason: Reason::NoChecksForExtension {
                    environment: label.clone(),
                },
                environment: Some(label),
                agent,
                working_dir,
                relative_path: relative,
            },
        };
    }
    Resolution::empty(Reason::NoMatchingEnvironment, project_root, relative)
}

/// Extension including the leading dot, or `""` when there is none.
pub fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

/// Posix-style path of `file` relative to `root`. Relative inputs are taken
/// as already relative to the root. `.` and `..` are folded lexically.
pub fn relative_path(file: &Path, root: &Path) -> String {
    let rel = if file.is_absolute() {
        let file = normalize(file);
        pathdiff::diff_paths(&file, normalize(root)).unwrap_or(file)
    } else {
        normalize(file)
    };
    if rel.is_absolute() {
        return rel.to_string_lossy().into_owned();
    }
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
