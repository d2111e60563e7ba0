//! Rule document schema loaded from `.lintgate.json`.
//!
//! Key components:
//! - `environments`: ordered rule-sets binding path prefixes to per-extension
//!   check lists. The first covering environment wins; nothing is merged.
//! - `tasks`: sub-agent routing rules (skip/message/review).
//! - `git`: per repository-state overrides for skipping checks.
//!
//! These types are immutable views; the validator runs on the raw JSON first
//! so that deserialization here only sees structurally sound documents.

use super::Severity;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Token in a check's `args` replaced with the edited file's path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Diagnostics kept per check when `maxDiagnostics` is not set.
pub const DEFAULT_MAX_DIAGNOSTICS: usize = 5;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
/// Root configuration document.
pub struct Config {
    pub environments: Vec<Environment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskRule>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub git: IndexMap<String, bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
/// One ordered rule-set ("environment").
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    /// Keys are `.ext` or comma-joined `.a,.b`; declaration order is kept.
    #[serde(default)]
    pub checks: IndexMap<String, Vec<Check>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub agents: IndexMap<String, String>,
    /// Working directory for checks, relative to the project root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

impl Environment {
    /// Display label: the name when set, else the positional path.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("environments[{}]", index),
        }
    }

    pub fn checks_for(&self, ext: &str) -> Option<&Vec<Check>> {
        lookup_extension(&self.checks, ext)
    }

    pub fn agent_for(&self, ext: &str) -> Option<&String> {
        lookup_extension(&self.agents, ext)
    }
}

/// Find the entry for `ext`: exact key first, then the first comma-joined key
/// listing it.
pub fn lookup_extension<'a, T>(map: &'a IndexMap<String, T>, ext: &str) -> Option<&'a T> {
    if let Some(v) = map.get(ext) {
        return Some(v);
    }
    map.iter()
        .find(|(key, _)| key.split(',').map(str::trim).any(|k| k == ext))
        .map(|(_, v)| v)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// One external command bound to an extension.
pub struct Check {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<ParserSpec>,
    #[serde(
        default,
        rename = "maxDiagnostics",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_diagnostics: Option<usize>,
    /// Provenance: `true` when auto-discovered and safe to refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<bool>,
}

impl Check {
    pub fn max_diagnostics(&self) -> usize {
        self.max_diagnostics.unwrap_or(DEFAULT_MAX_DIAGNOSTICS)
    }

    pub fn is_auto(&self) -> bool {
        self.auto.unwrap_or(false)
    }

    /// Arguments with every placeholder occurrence replaced by `file`.
    pub fn args_for(&self, file: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(FILE_PLACEHOLDER, file))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
/// Either a predefined parser name or a user regex with named groups.
pub enum ParserSpec {
    Named(String),
    Regex {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// What to do when a sub-agent identifier matches a rule.
pub enum TaskAction {
    Skip,
    Message,
    Review,
}

impl TaskAction {
    pub const NAMES: [&'static str; 3] = ["skip", "message", "review"];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskAction::Skip => "skip",
            TaskAction::Message => "message",
            TaskAction::Review => "review",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// Routing rule for completed sub-tasks.
pub struct TaskRule {
    pub name: String,
    /// Exact identifier, or `*<suffix>` capturing the prefix.
    #[serde(rename = "match")]
    pub pattern: String,
    pub action: TaskAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_document() {
        let doc = json!({
            "environments": [{
                "name": "api",
                "paths": ["services/api"],
                "excludes": ["**/*.gen.py"],
                "root": "services/api",
                "checks": {
                    ".py": [
                        {"name": "ruff", "command": "ruff", "args": ["check", "{file}"], "parser": "ruff", "auto": true},
                        {"name": "custom", "command": "lint", "args": ["{file}"],
                         "parser": {"pattern": "^(?P<line>\\d+): (?P<message>.*)$", "severity": "warning"},
                         "maxDiagnostics": 2}
                    ]
                },
                "agents": {".py": "python-engineer"}
            }],
            "tasks": [{"name": "review", "match": "*-engineer", "action": "review", "message": "Invoke *-reviewer"}],
            "git": {"merge": true}
        });
        let cfg: Config = serde_json::from_value(doc).unwrap();
        let env = &cfg.environments[0];
        let checks = env.checks_for(".py").unwrap();
        assert_eq!(checks[0].parser, Some(ParserSpec::Named("ruff".into())));
        assert!(checks[0].is_auto());
        assert_eq!(checks[0].max_diagnostics(), DEFAULT_MAX_DIAGNOSTICS);
        assert_eq!(checks[1].max_diagnostics(), 2);
        assert!(matches!(
            checks[1].parser,
            Some(ParserSpec::Regex { severity: Some(Severity::Warning), .. })
        ));
        assert!(!checks[1].is_auto());
        assert_eq!(env.agent_for(".py").map(String::as_str), Some("python-engineer"));
        assert_eq!(cfg.tasks[0].action, TaskAction::Review);
        assert_eq!(cfg.git.get("merge"), Some(&true));
    }

    #[test]
    fn test_lookup_extension_prefers_exact_then_declaration_order() {
        let mut map: IndexMap<String, u8> = IndexMap::new();
        map.insert(".js, .ts".into(), 1);
        map.insert(".ts,.tsx".into(), 2);
        map.insert(".tsx".into(), 3);
        assert_eq!(lookup_extension(&map, ".ts"), Some(&1));
        assert_eq!(lookup_extension(&map, ".tsx"), Some(&3));
        assert_eq!(lookup_extension(&map, ".py"), None);
    }

    #[test]
    fn test_args_for_replaces_every_placeholder() {
        let c = Check {
            name: "x".into(),
            command: "tool".into(),
            args: vec!["--stdin-filename={file}".into(), "{file}".into(), "-q".into()],
            parser: None,
            max_diagnostics: None,
            auto: None,
        };
        assert_eq!(
            c.args_for("/p/a.ts"),
            vec!["--stdin-filename=/p/a.ts", "/p/a.ts", "-q"]
        );
    }

    #[test]
    fn test_environment_label() {
        let named = Environment {
            name: Some("web".into()),
            ..Default::default()
        };
        assert_eq!(named.label(3), "web");
        assert_eq!(Environment::default().label(1), "environments[1]");
    }
}
