//! Output rendering for check, resolve, validate, route, and refresh.
//!
//! Supports `human` (default) and `json` outputs. The JSON forms include
//! per-item fields and a top-level summary. Block reasons and hook status
//! messages are plain text; the host shows them verbatim.

use crate::models::{CheckReport, CheckStatus, Diagnostic, FileReport, Severity, Summary};
use crate::refresh::RefreshResult;
use crate::resolve::Resolution;
use crate::tasks::TaskOutcome;
use crate::validate::ValidationReport;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => log::error!("failed to serialize output: {}", e),
    }
}

fn status_symbol(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Passed => "✓",
        CheckStatus::Failed => "✗",
        CheckStatus::Unavailable => "–",
    }
}

/// One-line summary of every check, e.g. `ruff ✗ · mypy ✓ · black –`.
pub fn status_line(checks: &[CheckReport]) -> String {
    checks
        .iter()
        .map(|c| format!("{} {}", c.name, status_symbol(c.status)))
        .collect::<Vec<_>>()
        .join(" · ")
}

/// `source LINE:COL [rule] message` without colour.
pub fn format_diagnostic(d: &Diagnostic) -> String {
    let mut out = d.source.clone();
    let loc = d.location();
    if !loc.is_empty() {
        out.push(' ');
        out.push_str(&loc);
    }
    if let Some(rule) = &d.rule {
        out.push_str(&format!(" [{}]", rule));
    }
    if d.severity == Severity::Warning {
        out.push_str(" (warning)");
    }
    let mut lines = d.message.lines();
    out.push_str(": ");
    out.push_str(lines.next().unwrap_or_default());
    for l in lines {
        out.push_str("\n      ");
        out.push_str(l);
    }
    out
}

/// Reason text for a blocked file: every diagnostic, an optional delegate
/// hint, and the status line last.
pub fn render_block_reason(report: &FileReport, agent: Option<&str>) -> String {
    let diags: Vec<&Diagnostic> = report.diagnostics().collect();
    let mut out = format!("lintgate: {} issue(s) in {}\n", diags.len(), report.file);
    for d in diags {
        out.push_str("  ");
        out.push_str(&format_diagnostic(d));
        out.push('\n');
    }
    if let Some(agent) = agent {
        out.push_str(&format!("Delegate the fixes to {}.\n", agent));
    }
    out.push_str(&status_line(&report.checks));
    out
}

/// Status message for a file that passed: the status line plus advisories.
pub fn render_continue_status(report: &FileReport) -> String {
    let mut out = format!("lintgate: {}", status_line(&report.checks));
    for d in report.diagnostics() {
        out.push_str("\n  ");
        out.push_str(&format_diagnostic(d));
    }
    out
}

/// Print per-file check results in the requested format.
pub fn print_check(reports: &[FileReport], output: &str) {
    match output {
        "json" => print_json(&compose_check_json(reports)),
        _ => {
            let color = use_colors(output);
            for r in reports {
                for d in r.diagnostics() {
                    let (icon, sev) = match d.severity {
                        Severity::Error => ("✖", "⟦error⟧"),
                        Severity::Warning => ("▲", "⟦warn⟧"),
                    };
                    let loc = match d.location() {
                        l if l.is_empty() => r.file.clone(),
                        l => format!("{}:{}", r.file, l),
                    };
                    let rule = d
                        .rule
                        .as_deref()
                        .map(|x| format!(" ❲{}❳", x))
                        .unwrap_or_default();
                    if color {
                        let (icon, sev) = match d.severity {
                            Severity::Error => (icon.red().to_string(), sev.red().bold().to_string()),
                            Severity::Warning => {
                                (icon.yellow().to_string(), sev.yellow().bold().to_string())
                            }
                        };
                        println!(
                            "{} {} {} {}{} — {}",
                            icon,
                            sev,
                            loc.bold(),
                            d.source.cyan(),
                            rule,
                            d.message
                        );
                    } else {
                        println!("{} {} {} {}{} — {}", icon, sev, loc, d.source, rule, d.message);
                    }
                }
                if !r.checks.is_empty() {
                    let line = format!("{}: {}", r.file, status_line(&r.checks));
                    if color {
                        println!("{}", line.bright_black());
                    } else {
                        println!("{}", line);
                    }
                }
            }
            let s = Summary::from_reports(reports);
            let summary = format!(
                "— Summary — errors={} warnings={} files={} blocked={}",
                s.errors, s.warnings, s.files, s.blocked
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Compose check JSON object (pure) for testing/snapshot purposes.
pub fn compose_check_json(reports: &[FileReport]) -> JsonVal {
    json!({
        "results": reports,
        "summary": Summary::from_reports(reports),
    })
}

/// Print which environment and checks apply to a file.
pub fn print_resolution(res: &Resolution, output: &str) {
    match output {
        "json" => print_json(&compose_resolution_json(res)),
        _ => {
            let color = use_colors(output);
            let reason = res.reason.to_string();
            if color {
                println!("{} {}", res.relative_path.bold(), reason.cyan());
            } else {
                println!("{} {}", res.relative_path, reason);
            }
            if let Some(env) = &res.environment {
                println!("  environment: {}", env);
                println!("  working dir: {}", res.working_dir.display());
            }
            if let Some(agent) = res.agent {
                println!("  agent: {}", agent);
            }
            for c in res.checks {
                println!("  - {}: {} {}", c.name, c.command, c.args.join(" "));
            }
        }
    }
}

/// Compose resolution JSON object (pure) for testing/snapshot purposes.
pub fn compose_resolution_json(res: &Resolution) -> JsonVal {
    json!({
        "file": res.relative_path,
        "reason": res.reason.as_str(),
        "detail": res.reason,
        "environment": res.environment,
        "agent": res.agent,
        "workingDir": res.working_dir.to_string_lossy(),
        "checks": res.checks,
    })
}

/// Print validator findings: errors, then warnings, then a summary line.
pub fn print_validation(report: &ValidationReport, file: &str, output: &str) {
    match output {
        "json" => print_json(&compose_validation_json(report)),
        _ => {
            let color = use_colors(output);
            for e in &report.errors {
                if color {
                    println!("{} {} {}", "✖".red(), "⟦error⟧".red().bold(), e);
                } else {
                    println!("✖ ⟦error⟧ {}", e);
                }
            }
            for w in &report.warnings {
                if color {
                    println!("{} {} {}", "▲".yellow(), "⟦warn⟧".yellow().bold(), w);
                } else {
                    println!("▲ ⟦warn⟧ {}", w);
                }
            }
            let summary = format!(
                "— {} — {} (errors={} warnings={})",
                file,
                if report.is_valid() { "valid" } else { "invalid" },
                report.errors.len(),
                report.warnings.len()
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Compose validation JSON object (pure) for testing/snapshot purposes.
pub fn compose_validation_json(report: &ValidationReport) -> JsonVal {
    json!({
        "errors": report.errors,
        "warnings": report.warnings,
        "valid": report.is_valid(),
    })
}

/// Print the routing decision for a sub-agent identifier.
pub fn print_route(identifier: &str, outcome: &TaskOutcome, output: &str) {
    match output {
        "json" => print_json(&compose_route_json(identifier, outcome)),
        _ => match outcome {
            TaskOutcome::Skip { rule } => println!("{}: skip (rule {})", identifier, rule),
            TaskOutcome::Advise { rule, message } => {
                println!("{}: message (rule {})\n  {}", identifier, rule, message)
            }
            TaskOutcome::Review { rule, message } => {
                println!("{}: review (rule {})\n  {}", identifier, rule, message)
            }
            TaskOutcome::NoMatch => println!("{}: no matching task rule", identifier),
        },
    }
}

/// Compose route JSON object (pure) for testing/snapshot purposes.
pub fn compose_route_json(identifier: &str, outcome: &TaskOutcome) -> JsonVal {
    let (action, rule, message) = match outcome {
        TaskOutcome::Skip { rule } => ("skip", Some(rule), None),
        TaskOutcome::Advise { rule, message } => ("message", Some(rule), Some(message)),
        TaskOutcome::Review { rule, message } => ("review", Some(rule), Some(message)),
        TaskOutcome::NoMatch => ("none", None, None),
    };
    json!({
        "identifier": identifier,
        "action": action,
        "rule": rule,
        "message": message,
        "blocking": matches!(outcome, TaskOutcome::Review { .. }),
    })
}

/// Print a refresh summary; without `write` the merged document is shown.
pub fn print_refresh(res: &RefreshResult, output: &str, write: bool) {
    match output {
        "json" => print_json(&compose_refresh_json(res, write)),
        _ => {
            let color = use_colors(output);
            let head = format!(
                "added={} removed={} kept={}",
                res.added, res.removed, res.kept
            );
            if !res.changed {
                println!("no changes ({})", head);
            } else if write {
                if color {
                    println!("{} {}", "✏️  refreshed:".green().bold(), head);
                } else {
                    println!("✏️  refreshed: {}", head);
                }
            } else {
                if color {
                    println!("{} {}", "--- preview".cyan().bold(), head);
                } else {
                    println!("--- preview {}", head);
                }
                print_json(&res.merged);
            }
        }
    }
}

/// Compose refresh JSON object (pure) for testing/snapshot purposes.
pub fn compose_refresh_json(res: &RefreshResult, write: bool) -> JsonVal {
    json!({
        "changed": res.changed,
        "wrote": write && res.changed,
        "summary": {"added": res.added, "removed": res.removed, "kept": res.kept},
        "preview": if write { None } else { Some(&res.merged) },
    })
}
