//! Output parsers turning raw tool text into diagnostics.
//!
//! A check names one of the built-in grammars below, supplies its own regex
//! with named groups, or gets the generic fallback. Every parser takes the
//! combined stdout+stderr text and never fails: output that does not fit the
//! grammar yields no diagnostics.
//!
//! Built-in grammars:
//! - `ruff`: `path:LINE:COL: CODE message`
//! - `rustc`: header `severity[rule]: message` followed by `--> path:LINE:COL`
//! - `eslint`: `path:LINE:COL severity message rule`
//! - `tsc`: `path(LINE,COL): severity CODE: message`
//! - `format`: any output means the file needs formatting
//! - `markdownlint`: `path:LINE:COL rule message`
//! - `jsonl`: one JSON object per line with `file`, `line`, `message`
//! - `gcc`: `path:LINE:COL: severity: message [code]`
//! - `generic`: first lines of output as one error

use crate::models::rules::ParserSpec;
use crate::models::{Diagnostic, Severity};
use regex::{Captures, Regex};
use serde_json::Value as Json;
use std::sync::LazyLock;

/// Names accepted for a string `parser` in the rule document.
pub const PARSER_NAMES: &[&str] = &[
    "ruff",
    "rustc",
    "eslint",
    "tsc",
    "format",
    "markdownlint",
    "jsonl",
    "gcc",
    "generic",
];

/// Lines of raw output kept when output is summarized into one diagnostic.
pub const RAW_PREVIEW_LINES: usize = 5;

static RUFF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+?):(?P<line>\d+):(?P<col>\d+): (?P<code>[A-Z]+[0-9]+) (?P<msg>.+)$")
        .unwrap()
});
static RUSTC_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sev>error|warning)(?:\[(?P<rule>[^\]]+)\])?: (?P<msg>.+)$").unwrap()
});
static RUSTC_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?:-->|┌─|╭─)?\s*(?P<path>\S.*?):(?P<line>\d+):(?P<col>\d+)\s*$").unwrap()
});
static ESLINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?P<path>.*?):)?(?P<line>\d+):(?P<col>\d+)\s+(?P<sev>error|warning)\s+(?P<msg>.+?)\s+(?P<rule>\S+)\s*$",
    )
    .unwrap()
});
static TSC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<path>.+?)\((?P<line>\d+),(?P<col>\d+)\): (?P<sev>error|warning) (?P<code>[A-Za-z]+\d+): (?P<msg>.+)$",
    )
    .unwrap()
});
static MARKDOWNLINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>.+?):(?P<line>\d+)(?::(?P<col>\d+))? (?P<rule>\S+) (?P<msg>.+)$").unwrap()
});
static GCC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<path>.+?):(?P<line>\d+)(?::(?P<col>\d+))?: (?P<sev>[A-Za-z]+): (?P<msg>.+?)(?:\s+\[(?P<code>[^\]]+)\])?\s*$",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Predefined output grammars.
pub enum BuiltinParser {
    Ruff,
    Rustc,
    Eslint,
    Tsc,
    Format,
    Markdownlint,
    Jsonl,
    Gcc,
    Generic,
}

impl BuiltinParser {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ruff" => Self::Ruff,
            "rustc" => Self::Rustc,
            "eslint" => Self::Eslint,
            "tsc" => Self::Tsc,
            "format" => Self::Format,
            "markdownlint" => Self::Markdownlint,
            "jsonl" => Self::Jsonl,
            "gcc" => Self::Gcc,
            "generic" => Self::Generic,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ruff => "ruff",
            Self::Rustc => "rustc",
            Self::Eslint => "eslint",
            Self::Tsc => "tsc",
            Self::Format => "format",
            Self::Markdownlint => "markdownlint",
            Self::Jsonl => "jsonl",
            Self::Gcc => "gcc",
            Self::Generic => "generic",
        }
    }

    fn parse(self, output: &str) -> Vec<Diagnostic> {
        match self {
            Self::Ruff => parse_lines(output, &RUFF_RE, |c| {
                Diagnostic::new(text(c, "msg"), Severity::Error)
                    .at(number(c, "line"), number(c, "col"))
                    .with_rule(c.name("code").map(|m| m.as_str().to_string()))
            }),
            Self::Rustc => parse_rustc(output),
            Self::Eslint => parse_lines(output, &ESLINT_RE, |c| {
                Diagnostic::new(text(c, "msg"), keyword_severity(c, "sev"))
                    .at(number(c, "line"), number(c, "col"))
                    .with_rule(c.name("rule").map(|m| m.as_str().to_string()))
            }),
            Self::Tsc => parse_lines(output, &TSC_RE, |c| {
                Diagnostic::new(text(c, "msg"), keyword_severity(c, "sev"))
                    .at(number(c, "line"), number(c, "col"))
                    .with_rule(c.name("code").map(|m| m.as_str().to_string()))
            }),
            Self::Format => {
                if output.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![Diagnostic::new(
                        "File is not formatted; run the formatter to fix it",
                        Severity::Error,
                    )]
                }
            }
            Self::Markdownlint => parse_lines(output, &MARKDOWNLINT_RE, |c| {
                Diagnostic::new(text(c, "msg"), Severity::Error)
                    .at(number(c, "line"), number(c, "col"))
                    .with_rule(c.name("rule").map(|m| m.as_str().to_string()))
            }),
            Self::Jsonl => output.lines().filter_map(parse_json_line).collect(),
            Self::Gcc => parse_lines(output, &GCC_RE, |c| {
                let sev = if text(c, "sev").eq_ignore_ascii_case("error") {
                    Severity::Error
                } else {
                    Severity::Warning
                };
                Diagnostic::new(text(c, "msg"), sev)
                    .at(number(c, "line"), number(c, "col"))
                    .with_rule(c.name("code").map(|m| m.as_str().to_string()))
            }),
            Self::Generic => {
                if output.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![Diagnostic::new(preview(output, RAW_PREVIEW_LINES), Severity::Error)]
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
/// User-supplied line-oriented regex parser.
pub struct RegexParser {
    re: Regex,
    default_severity: Severity,
    named: bool,
}

impl RegexParser {
    pub fn compile(pattern: &str, severity: Option<Severity>) -> Result<Self, regex::Error> {
        let re = Regex::new(pattern)?;
        let named = re.capture_names().any(|n| n.is_some());
        Ok(Self {
            re,
            default_severity: severity.unwrap_or(Severity::Error),
            named,
        })
    }

    fn parse(&self, output: &str) -> Vec<Diagnostic> {
        if !self.named {
            return Vec::new();
        }
        let mut out = Vec::new();
        for line in output.lines() {
            let Some(c) = self.re.captures(line) else {
                continue;
            };
            let message = c
                .name("message")
                .map(|m| m.as_str().trim())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| line.trim());
            let severity = c
                .name("severity")
                .and_then(|m| Severity::from_keyword(m.as_str()))
                .unwrap_or(self.default_severity);
            out.push(
                Diagnostic::new(message, severity)
                    .at(number(&c, "line"), number(&c, "column"))
                    .with_rule(c.name("rule").map(|m| m.as_str().to_string())),
            );
        }
        out
    }
}

#[derive(Debug, Clone)]
/// A resolved parser: one `parse` capability regardless of its origin.
pub enum Parser {
    Builtin(BuiltinParser),
    Regex(RegexParser),
}

impl Parser {
    pub fn parse(&self, output: &str) -> Vec<Diagnostic> {
        match self {
            Parser::Builtin(b) => b.parse(output),
            Parser::Regex(r) => r.parse(output),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Parser::Builtin(b) => b.name(),
            Parser::Regex(_) => "regex",
        }
    }
}

/// Resolve a check's parser spec. Unknown names and invalid regexes fall back
/// to the generic parser instead of failing the check run.
pub fn get_parser(spec: Option<&ParserSpec>) -> Parser {
    match spec {
        None => Parser::Builtin(BuiltinParser::Generic),
        Some(ParserSpec::Named(name)) => match BuiltinParser::from_name(name) {
            Some(b) => Parser::Builtin(b),
            None => {
                log::warn!("unknown parser '{}', using generic", name);
                Parser::Builtin(BuiltinParser::Generic)
            }
        },
        Some(ParserSpec::Regex { pattern, severity }) => {
            match RegexParser::compile(pattern, *severity) {
                Ok(r) => Parser::Regex(r),
                Err(e) => {
                    log::warn!("parser pattern did not compile ({}), using generic", e);
                    Parser::Builtin(BuiltinParser::Generic)
                }
            }
        }
    }
}

/// First `n` lines of the trimmed output.
pub fn preview(output: &str, n: usize) -> String {
    output.trim().lines().take(n).collect::<Vec<_>>().join("\n")
}

fn parse_lines<F>(output: &str, re: &Regex, build: F) -> Vec<Diagnostic>
where
    F: Fn(&Captures) -> Diagnostic,
{
    output
        .lines()
        .filter_map(|line| re.captures(line.trim_end()))
        .map(|c| build(&c))
        .collect()
}

fn parse_rustc(output: &str) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let mut pending: Option<Diagnostic> = None;
    for line in output.lines() {
        let line = line.trim_end();
        if let Some(c) = RUSTC_HEADER_RE.captures(line) {
            pending = Some(
                Diagnostic::new(text(&c, "msg"), keyword_severity(&c, "sev"))
                    .with_rule(c.name("rule").map(|m| m.as_str().to_string())),
            );
            continue;
        }
        if pending.is_none() {
            continue;
        }
        if let Some(c) = RUSTC_LOCATION_RE.captures(line) {
            if let Some(d) = pending.take() {
                out.push(d.at(number(&c, "line"), number(&c, "col")));
            }
        }
    }
    out
}

fn parse_json_line(line: &str) -> Option<Diagnostic> {
    let v: Json = serde_json::from_str(line.trim()).ok()?;
    v.get("file")?.as_str()?;
    let line_no = u32::try_from(v.get("line")?.as_u64()?).ok()?;
    let message = v.get("message")?.as_str()?;
    let column = match v.get("column").and_then(Json::as_u64) {
        Some(c) => u32::try_from(c).ok(),
        None => Some(1),
    };
    let rule = v
        .get("rule")
        .or_else(|| v.get("code"))
        .and_then(Json::as_str)
        .map(str::to_string);
    let severity = v
        .get("severity")
        .and_then(Json::as_str)
        .and_then(Severity::from_keyword)
        .unwrap_or(Severity::Error);
    Some(
        Diagnostic::new(message, severity)
            .at(Some(line_no), column)
            .with_rule(rule),
    )
}

fn text<'h>(c: &Captures<'h>, name: &str) -> &'h str {
    c.name(name).map_or("", |m| m.as_str().trim())
}

fn number(c: &Captures, name: &str) -> Option<u32> {
    c.name(name).and_then(|m| m.as_str().parse().ok())
}

fn keyword_severity(c: &Captures, name: &str) -> Severity {
    c.name(name)
        .and_then(|m| Severity::from_keyword(m.as_str()))
        .unwrap_or(Severity::Error)
}
