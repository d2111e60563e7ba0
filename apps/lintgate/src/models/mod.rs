//! Shared data models for diagnostics, check reports, and the rule document.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a normalized finding.
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }

    /// Parse a tool-provided severity keyword. Accepts `warn` as a warning.
    pub fn from_keyword(s: &str) -> Option<Severity> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One normalized finding produced from a check's output.
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub severity: Severity,
    pub source: String,
}

impl Diagnostic {
    /// A location-less diagnostic; `source` is stamped later by the executor.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            line: None,
            column: None,
            message: message.into(),
            rule: None,
            severity,
            source: String::new(),
        }
    }

    pub fn at(mut self, line: Option<u32>, column: Option<u32>) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_rule(mut self, rule: Option<String>) -> Self {
        self.rule = rule.filter(|r| !r.is_empty());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// `LINE:COL`, `LINE`, or empty when the tool gave no location.
    pub fn location(&self) -> String {
        match (self.line, self.column) {
            (Some(l), Some(c)) => format!("{}:{}", l, c),
            (Some(l), None) => l.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Outcome of a single check execution.
pub enum CheckStatus {
    /// Exited 0, or soft-passed on a "command not found" message.
    Passed,
    /// Non-zero exit; diagnostics carry the findings. Blocks the event.
    Failed,
    /// Tool missing or could not be spawned. Advisory only.
    Unavailable,
}

#[derive(Debug, Clone, Serialize)]
/// Result of running one configured check against one file.
pub struct CheckReport {
    pub name: String,
    pub status: CheckStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn blocks(&self) -> bool {
        self.status == CheckStatus::Failed
    }
}

#[derive(Debug, Clone, Serialize)]
/// All check reports for one file, in check declaration order.
pub struct FileReport {
    pub file: String,
    pub checks: Vec<CheckReport>,
}

impl FileReport {
    pub fn blocked(&self) -> bool {
        self.checks.iter().any(CheckReport::blocks)
    }

    /// Diagnostics in check order, then parser order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.checks.iter().flat_map(|c| c.diagnostics.iter())
    }
}

#[derive(Debug, Default, Serialize)]
/// Aggregated summary used by printers.
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub files: usize,
    pub blocked: usize,
}

impl Summary {
    pub fn from_reports(reports: &[FileReport]) -> Self {
        let mut s = Summary {
            files: reports.len(),
            ..Default::default()
        };
        for r in reports {
            if r.blocked() {
                s.blocked += 1;
            }
            for d in r.diagnostics() {
                match d.severity {
                    Severity::Error => s.errors += 1,
                    Severity::Warning => s.warnings += 1,
                }
            }
        }
        s
    }
}
