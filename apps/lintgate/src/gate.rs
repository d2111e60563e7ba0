//! Event dispatch: turn a file edit or a finished sub-task into a
//! continue/block decision.
//!
//! Configuration problems always block. Missing tools never do. Everything
//! else blocks only when a check ran and failed.

use crate::config::{load_config, ConfigError, Effective};
use crate::models::rules::Config;
use crate::executor::{run_checks, CommandRunner};
use crate::git::detect_state;
use crate::models::{CheckReport, CheckStatus, Diagnostic, FileReport, Severity};
use crate::output::{render_block_reason, render_continue_status};
use crate::resolve::{relative_path, resolve};
use crate::tasks::{route, TaskOutcome};
use crate::validate::validate_str;
use std::fs;
use std::path::Path;

/// Name used for reports about the rule document itself.
pub const CONFIG_CHECK: &str = "config";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Decision handed back to the host.
pub enum Outcome {
    Continue { status: Option<String> },
    Block { reason: String },
}

impl Outcome {
    pub fn silent() -> Self {
        Outcome::Continue { status: None }
    }

    fn status(s: impl Into<String>) -> Self {
        Outcome::Continue {
            status: Some(s.into()),
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Outcome::Block { .. })
    }
}

#[derive(Debug, Clone)]
/// Result of gating one edited file.
pub struct FileVerdict {
    pub report: FileReport,
    pub outcome: Outcome,
}

impl FileVerdict {
    fn skipped(file: String, status: String) -> Self {
        Self {
            report: FileReport {
                file,
                checks: Vec::new(),
            },
            outcome: Outcome::status(status),
        }
    }

    fn from_report(report: FileReport, agent: Option<&str>) -> Self {
        let outcome = if report.checks.is_empty() {
            Outcome::silent()
        } else if report.blocked() {
            Outcome::Block {
                reason: render_block_reason(&report, agent),
            }
        } else {
            Outcome::status(render_continue_status(&report))
        };
        Self { report, outcome }
    }
}

fn config_report(file: String, status: CheckStatus, diagnostics: Vec<Diagnostic>) -> FileReport {
    FileReport {
        file,
        checks: vec![CheckReport {
            name: CONFIG_CHECK.to_string(),
            status,
            diagnostics: diagnostics
                .into_iter()
                .map(|d| d.with_source(CONFIG_CHECK))
                .collect(),
        }],
    }
}

/// Report for an unusable rule document; always blocks.
pub fn config_error_verdict(file: String, err: &ConfigError) -> FileVerdict {
    let diagnostics = err
        .messages()
        .into_iter()
        .map(|m| Diagnostic::new(m, Severity::Error))
        .collect();
    FileVerdict::from_report(config_report(file, CheckStatus::Failed, diagnostics), None)
}

/// Validate the rule document after it was edited. No external tool runs.
pub fn check_config_file(eff: &Effective) -> FileVerdict {
    let file = relative_path(&eff.config_path, &eff.project_root);
    let text = match fs::read_to_string(&eff.config_path) {
        Ok(t) => t,
        Err(source) => {
            let err = ConfigError::Io {
                path: eff.config_path.clone(),
                source,
            };
            return config_error_verdict(file, &err);
        }
    };
    let report = validate_str(&text);
    if !report.is_valid() {
        let diagnostics = report
            .errors
            .iter()
            .map(|e| Diagnostic::new(e.as_str(), Severity::Error))
            .collect();
        return FileVerdict::from_report(
            config_report(file, CheckStatus::Failed, diagnostics),
            None,
        );
    }
    let diagnostics = report
        .warnings
        .iter()
        .map(|w| Diagnostic::new(w.as_str(), Severity::Warning))
        .collect();
    let mut verdict =
        FileVerdict::from_report(config_report(file.clone(), CheckStatus::Passed, diagnostics), None);
    verdict.outcome = Outcome::status(match report.warnings.len() {
        0 => format!("lintgate: {} is valid", file),
        n => format!(
            "lintgate: {} is valid with {} warning(s):\n{}",
            file,
            n,
            report
                .warnings
                .iter()
                .map(|w| format!("  - {}", w))
                .collect::<Vec<_>>()
                .join("\n")
        ),
    });
    verdict
}

/// Gate one edited file.
pub fn check_file<R: CommandRunner + ?Sized>(eff: &Effective, file: &Path, runner: &R) -> FileVerdict {
    if eff.is_config_file(file) {
        return check_config_file(eff);
    }
    let abs = if file.is_absolute() {
        file.to_path_buf()
    } else {
        eff.project_root.join(file)
    };
    let rel = relative_path(&abs, &eff.project_root);

    let config = match load_config(&eff.config_path) {
        Ok(Some(c)) => c,
        Ok(None) => return FileVerdict::skipped(rel, "lintgate: no-config".into()),
        Err(e) => return config_error_verdict(rel, &e),
    };
    check_with_config(eff, &config, &abs, rel, runner)
}

fn check_with_config<R: CommandRunner + ?Sized>(
    eff: &Effective,
    config: &Config,
    abs: &Path,
    rel: String,
    runner: &R,
) -> FileVerdict {
    if let Some(state) = detect_state(&eff.project_root) {
        if !state.runs_checks(&config.git) {
            log::debug!("{} in progress, skipping checks", state.as_str());
            return FileVerdict::skipped(
                rel,
                format!("lintgate: {} in progress; checks skipped", state.as_str()),
            );
        }
    }

    let resolution = resolve(Some(config), abs, &eff.project_root);
    if !resolution.is_ok() {
        return FileVerdict::skipped(rel, format!("lintgate: {}", resolution.reason));
    }

    let file_arg = abs.to_string_lossy();
    let checks = run_checks(resolution.checks, &file_arg, &resolution.working_dir, runner);
    FileVerdict::from_report(FileReport { file: rel, checks }, resolution.agent)
}

/// Route a finished sub-task through the `tasks` rules.
pub fn check_task(eff: &Effective, identifier: &str) -> Outcome {
    let config = match load_config(&eff.config_path) {
        Ok(Some(c)) => c,
        Ok(None) => return Outcome::silent(),
        Err(e) => {
            return Outcome::Block {
                reason: format!("lintgate: {}", e),
            }
        }
    };
    task_outcome(route(&config.tasks, identifier))
}

/// Map a routing decision onto the host decision.
pub fn task_outcome(outcome: TaskOutcome) -> Outcome {
    match outcome {
        TaskOutcome::Skip { .. } | TaskOutcome::NoMatch => Outcome::silent(),
        TaskOutcome::Advise { message, .. } => Outcome::status(message),
        TaskOutcome::Review { message, .. } => Outcome::Block { reason: message },
    }
}
