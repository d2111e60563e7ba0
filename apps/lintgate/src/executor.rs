//! Check execution: run one external command per check and turn its result
//! into a `CheckReport`.
//!
//! Process spawning sits behind the `CommandRunner` trait so the decision
//! logic can be exercised without real tools. Checks run one after another in
//! declaration order; a failing check never stops its siblings.

use crate::models::rules::Check;
use crate::models::{CheckReport, CheckStatus, Diagnostic, Severity};
use crate::parsers::{get_parser, preview, RAW_PREVIEW_LINES};
use std::path::Path;
use std::process::{Command, Stdio};

/// Captured result of one process run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `-1` when the process was killed by a signal.
    pub exit_code: i32,
    pub success: bool,
}

impl ToolOutput {
    /// Stdout and stderr joined by a newline.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to start '{tool}': {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
}

/// Spawns commands on behalf of the executor.
pub trait CommandRunner {
    /// Whether `command` can be resolved from `cwd`.
    fn is_available(&self, command: &str, cwd: &Path) -> bool;

    fn run(&self, command: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, ExecutorError>;
}

/// Runs real processes with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn is_available(&self, command: &str, cwd: &Path) -> bool {
        if command.contains('/') || command.contains('\\') {
            return cwd.join(command).is_file();
        }

        #[cfg(unix)]
        let finder = "which";
        #[cfg(windows)]
        let finder = "where";

        Command::new(finder)
            .arg(command)
            .current_dir(cwd)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    fn run(&self, command: &str, args: &[String], cwd: &Path) -> Result<ToolOutput, ExecutorError> {
        let output = Command::new(command)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExecutorError::Spawn {
                tool: command.to_string(),
                source,
            })?;
        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        })
    }
}

/// Run one check against `file_path` with `cwd` as working directory.
pub fn run_check<R: CommandRunner + ?Sized>(
    check: &Check,
    file_path: &str,
    cwd: &Path,
    runner: &R,
) -> CheckReport {
    let report = |status, diagnostics| CheckReport {
        name: check.name.clone(),
        status,
        diagnostics,
    };
    let unavailable = |message: String| {
        report(
            CheckStatus::Unavailable,
            vec![Diagnostic::new(message, Severity::Warning).with_source(&check.name)],
        )
    };

    if !runner.is_available(&check.command, cwd) {
        log::warn!("{}: '{}' is not installed", check.name, check.command);
        return unavailable(format!(
            "'{}' not found; skipped {} (install it or remove the check)",
            check.command, check.name
        ));
    }

    let args = check.args_for(file_path);
    log::debug!("running {}: {} {}", check.name, check.command, args.join(" "));
    let out = match runner.run(&check.command, &args, cwd) {
        Ok(out) => out,
        Err(e) => {
            log::warn!("{}: {}", check.name, e);
            return unavailable(e.to_string());
        }
    };

    if out.success {
        return report(CheckStatus::Passed, Vec::new());
    }

    let combined = out.combined();
    if combined.to_ascii_lowercase().contains("command not found") {
        log::debug!("{}: command not found in output, treating as passed", check.name);
        return report(CheckStatus::Passed, Vec::new());
    }

    let parser = get_parser(check.parser.as_ref());
    log::debug!("{}: exit {}, parsing with {}", check.name, out.exit_code, parser.describe());
    let mut diagnostics = parser.parse(&combined);
    if diagnostics.is_empty() {
        let raw = preview(&combined, RAW_PREVIEW_LINES);
        let message = if raw.is_empty() {
            format!("{} exited with status {}", check.command, out.exit_code)
        } else {
            raw
        };
        diagnostics.push(Diagnostic::new(message, Severity::Error));
    }
    diagnostics.truncate(check.max_diagnostics());
    let diagnostics = diagnostics
        .into_iter()
        .map(|d| d.with_source(&check.name))
        .collect();
    report(CheckStatus::Failed, diagnostics)
}

/// Run every check in order. All checks run regardless of earlier failures.
pub fn run_checks<R: CommandRunner + ?Sized>(
    checks: &[Check],
    file_path: &str,
    cwd: &Path,
    runner: &R,
) -> Vec<CheckReport> {
    checks
        .iter()
        .map(|c| run_check(c, file_path, cwd, runner))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rules::ParserSpec;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeRunner {
        missing: Vec<&'static str>,
        outputs: HashMap<&'static str, ToolOutput>,
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl FakeRunner {
        fn with(mut self, command: &'static str, code: i32, stdout: &str, stderr: &str) -> Self {
            self.outputs.insert(
                command,
                ToolOutput {
                    stdout: stdout.into(),
                    stderr: stderr.into(),
                    exit_code: code,
                    success: code == 0,
                },
            );
            self
        }
    }

    impl CommandRunner for FakeRunner {
        fn is_available(&self, command: &str, _cwd: &Path) -> bool {
            !self.missing.contains(&command)
        }

        fn run(&self, command: &str, args: &[String], _cwd: &Path) -> Result<ToolOutput, ExecutorError> {
            self.calls
                .borrow_mut()
                .push((command.to_string(), args.to_vec()));
            self.outputs.get(command).cloned().ok_or_else(|| ExecutorError::Spawn {
                tool: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    fn check(name: &str, parser: Option<&str>) -> Check {
        Check {
            name: name.into(),
            command: name.into(),
            args: vec!["check".into(), "{file}".into()],
            parser: parser.map(|p| ParserSpec::Named(p.into())),
            max_diagnostics: None,
            auto: None,
        }
    }

    const RUFF_FIVE: &str = "a.py:1:1: F401 one\na.py:2:1: F401 two\na.py:3:1: F401 three\n\
                             a.py:4:1: F401 four\na.py:5:1: F401 five\n";

    #[test]
    fn test_max_diagnostics_keeps_first_in_order() {
        let runner = FakeRunner::default().with("ruff", 1, RUFF_FIVE, "");
        let mut c = check("ruff", Some("ruff"));
        c.max_diagnostics = Some(2);
        let r = run_check(&c, "a.py", Path::new("."), &runner);
        assert_eq!(r.status, CheckStatus::Failed);
        let msgs: Vec<_> = r.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(msgs, vec!["one", "two"]);
        assert!(r.diagnostics.iter().all(|d| d.source == "ruff"));
    }

    #[test]
    fn test_default_cap_is_five() {
        let six = format!("{}a.py:6:1: F401 six\n", RUFF_FIVE);
        let runner = FakeRunner::default().with("ruff", 1, &six, "");
        let r = run_check(&check("ruff", Some("ruff")), "a.py", Path::new("."), &runner);
        assert_eq!(r.diagnostics.len(), 5);
    }

    #[test]
    fn test_placeholder_substituted_and_exit_zero_passes() {
        let runner = FakeRunner::default().with("ruff", 0, "a.py:1:1: F401 ignored", "");
        let r = run_check(&check("ruff", Some("ruff")), "src/a.py", Path::new("."), &runner);
        assert_eq!(r.status, CheckStatus::Passed);
        assert!(r.diagnostics.is_empty());
        assert_eq!(
            runner.calls.borrow()[0],
            ("ruff".to_string(), vec!["check".to_string(), "src/a.py".to_string()])
        );
    }

    #[test]
    fn test_missing_tool_is_soft() {
        let runner = FakeRunner {
            missing: vec!["mypy"],
            ..Default::default()
        };
        let r = run_check(&check("mypy", None), "a.py", Path::new("."), &runner);
        assert_eq!(r.status, CheckStatus::Unavailable);
        assert!(!r.blocks());
        assert_eq!(r.diagnostics.len(), 1);
        assert_eq!(r.diagnostics[0].severity, Severity::Warning);
        assert!(r.diagnostics[0].message.contains("'mypy' not found"));
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_command_not_found_in_output_is_soft_pass() {
        let runner = FakeRunner::default().with("npx", 127, "", "sh: eslint: Command Not Found\n");
        let r = run_check(&check("npx", Some("eslint")), "a.ts", Path::new("."), &runner);
        assert_eq!(r.status, CheckStatus::Passed);
        assert!(r.diagnostics.is_empty());
    }

    #[test]
    fn test_unparsed_failure_carries_raw_preview() {
        let runner = FakeRunner::default().with(
            "ruff",
            2,
            "",
            "boom\nline2\nline3\nline4\nline5\nline6\n",
        );
        let r = run_check(&check("ruff", Some("ruff")), "a.py", Path::new("."), &runner);
        assert_eq!(r.status, CheckStatus::Failed);
        assert_eq!(r.diagnostics.len(), 1);
        assert_eq!(r.diagnostics[0].message, "boom\nline2\nline3\nline4\nline5");
        assert_eq!(r.diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn test_silent_failure_reports_exit_status() {
        let runner = FakeRunner::default().with("black", 1, "", "");
        let r = run_check(&check("black", Some("ruff")), "a.py", Path::new("."), &runner);
        assert_eq!(r.diagnostics[0].message, "black exited with status 1");
        assert_eq!(r.diagnostics[0].source, "black");
    }

    #[test]
    fn test_spawn_failure_is_unavailable() {
        let runner = FakeRunner::default();
        let r = run_check(&check("ghost", None), "a.py", Path::new("."), &runner);
        assert_eq!(r.status, CheckStatus::Unavailable);
        assert!(r.diagnostics[0].message.contains("failed to start 'ghost'"));
    }

    #[test]
    fn test_run_checks_runs_all_in_order() {
        let runner = FakeRunner::default()
            .with("ruff", 1, RUFF_FIVE, "")
            .with("mypy", 0, "", "")
            .with("black", 1, "would reformat a.py", "");
        let checks = vec![
            check("ruff", Some("ruff")),
            check("mypy", None),
            check("black", Some("format")),
        ];
        let reports = run_checks(&checks, "a.py", Path::new("."), &runner);
        let statuses: Vec<_> = reports.iter().map(|r| (r.name.as_str(), r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("ruff", CheckStatus::Failed),
                ("mypy", CheckStatus::Passed),
                ("black", CheckStatus::Failed),
            ]
        );
        let called: Vec<_> = runner.calls.borrow().iter().map(|(c, _)| c.clone()).collect();
        assert_eq!(called, vec!["ruff", "mypy", "black"]);
    }

    #[cfg(unix)]
    mod system {
        use super::*;

        fn sh_check(script: &str, parser: Option<&str>) -> Check {
            Check {
                name: "sh".into(),
                command: "sh".into(),
                args: vec!["-c".into(), script.into(), "sh".into(), "{file}".into()],
                parser: parser.map(|p| ParserSpec::Named(p.into())),
                max_diagnostics: None,
                auto: None,
            }
        }

        #[test]
        fn test_real_process_failure_is_parsed() {
            let dir = tempfile::tempdir().unwrap();
            let c = sh_check("echo \"$1:3:7: E501 too long\"; exit 1", Some("ruff"));
            let r = run_check(&c, "x.py", dir.path(), &SystemRunner);
            assert_eq!(r.status, CheckStatus::Failed);
            assert_eq!(r.diagnostics[0].line, Some(3));
            assert_eq!(r.diagnostics[0].column, Some(7));
            assert_eq!(r.diagnostics[0].rule.as_deref(), Some("E501"));
        }

        #[test]
        fn test_real_process_runs_in_cwd() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("marker.txt"), "").unwrap();
            let c = sh_check("test -f marker.txt", None);
            let r = run_check(&c, "x.py", dir.path(), &SystemRunner);
            assert_eq!(r.status, CheckStatus::Passed);
        }

        #[test]
        fn test_unknown_binary_is_unavailable() {
            let dir = tempfile::tempdir().unwrap();
            let mut c = sh_check("", None);
            c.command = "lintgate-no-such-tool-xyz".into();
            let r = run_check(&c, "x.py", dir.path(), &SystemRunner);
            assert_eq!(r.status, CheckStatus::Unavailable);

            c.command = "./missing.sh".into();
            assert!(!SystemRunner.is_available(&c.command, dir.path()));
        }
    }
}
