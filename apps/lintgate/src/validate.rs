//! Structural validation of the rule document.
//!
//! Runs on the raw JSON rather than the typed `Config` so that every problem
//! in a document is reported at once with a path such as
//! `environments[0].checks[".py"][1].args`. Validation never fails: it always
//! returns a `ValidationReport`, and a document with no errors is safe to
//! deserialize.

use crate::models::rules::{TaskAction, FILE_PLACEHOLDER};
use crate::parsers::PARSER_NAMES;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value as Json};
use std::collections::HashSet;

/// Top-level keys understood by the loader.
pub const TOP_LEVEL_KEYS: [&str; 3] = ["environments", "tasks", "git"];

/// Repository states that the `git` map may override.
pub const GIT_STATES: [&str; 5] = ["merge", "rebase", "cherry-pick", "revert", "bisect"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Collected validation findings; errors make the document unusable.
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, msg: String) {
        self.errors.push(msg);
    }

    fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }
}

/// Parse `text` as JSON, then validate. A syntax error is the only error.
pub fn validate_str(text: &str) -> ValidationReport {
    match serde_json::from_str::<Json>(text) {
        Ok(v) => validate(&v),
        Err(e) => ValidationReport {
            errors: vec![format!(
                "invalid JSON at line {}, column {}: {}",
                e.line(),
                e.column(),
                e
            )],
            warnings: Vec::new(),
        },
    }
}

/// Validate a parsed rule document.
pub fn validate(doc: &Json) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(root) = doc.as_object() else {
        report.error("configuration must be a JSON object".into());
        return report;
    };

    for key in root.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            report.warn(format!("unknown top-level key '{}' is ignored", key));
        }
    }

    match root.get("environments") {
        None => report.error("environments is required".into()),
        Some(Json::Array(envs)) if envs.is_empty() => {
            report.error("environments must not be empty".into())
        }
        Some(Json::Array(envs)) => {
            let mut names = HashSet::new();
            for (i, env) in envs.iter().enumerate() {
                validate_environment(env, &format!("environments[{}]", i), &mut names, &mut report);
            }
        }
        Some(_) => report.error("environments must be an array".into()),
    }

    match root.get("tasks") {
        None => {}
        Some(Json::Array(tasks)) => validate_tasks(tasks, &mut report),
        Some(_) => report.error("tasks must be an array".into()),
    }

    match root.get("git") {
        None => {}
        Some(Json::Object(git)) => {
            for (state, flag) in git {
                if !flag.is_boolean() {
                    report.error(format!("git.{} must be a boolean", state));
                }
                if !GIT_STATES.contains(&state.as_str()) {
                    report.warn(format!(
                        "git.{} is not a known repository state (expected one of: {})",
                        state,
                        GIT_STATES.join(", ")
                    ));
                }
            }
        }
        Some(_) => report.error("git must be an object".into()),
    }

    report
}

fn validate_environment(
    env: &Json,
    path: &str,
    names: &mut HashSet<String>,
    report: &mut ValidationReport,
) {
    let Some(env) = env.as_object() else {
        report.error(format!("{} must be an object", path));
        return;
    };

    match env.get("name") {
        None => {}
        Some(Json::String(name)) => {
            if !names.insert(name.clone()) {
                report.error(format!("{}.name '{}' is used by more than one environment", path, name));
            }
        }
        Some(_) => report.error(format!("{}.name must be a string", path)),
    }

    match env.get("paths") {
        Some(Json::Array(paths)) if !paths.is_empty() => {
            for (j, p) in paths.iter().enumerate() {
                if !p.is_string() {
                    report.error(format!("{}.paths[{}] must be a string", path, j));
                }
            }
        }
        _ => report.error(format!("{}.paths must be a non-empty array of strings", path)),
    }

    string_array(env, "excludes", path, report);

    match env.get("root") {
        None | Some(Json::String(_)) => {}
        Some(_) => report.error(format!("{}.root must be a string", path)),
    }

    match env.get("agents") {
        None => {}
        Some(Json::Object(agents)) => {
            for (ext, agent) in agents {
                if !agent.is_string() {
                    report.error(format!("{}.agents[\"{}\"] must be a string", path, ext));
                }
            }
        }
        Some(_) => report.error(format!("{}.agents must be an object", path)),
    }

    match env.get("checks") {
        None => report.warn(format!("{} has no checks", path)),
        Some(Json::Object(checks)) if checks.is_empty() => {
            report.warn(format!("{} has no checks", path))
        }
        Some(Json::Object(checks)) => {
            for (ext, list) in checks {
                let list_path = format!("{}.checks[\"{}\"]", path, ext);
                let Some(list) = list.as_array() else {
                    report.error(format!("{} must be an array of checks", list_path));
                    continue;
                };
                if list.is_empty() {
                    report.warn(format!("{} is empty; {} files are not checked", list_path, ext));
                }
                let mut seen = HashSet::new();
                for (k, check) in list.iter().enumerate() {
                    let check_path = format!("{}[{}]", list_path, k);
                    if let Some(name) = validate_check(check, &check_path, report) {
                        if !seen.insert(name.to_string()) {
                            report.warn(format!(
                                "{}.name '{}' is repeated within {}",
                                check_path, name, list_path
                            ));
                        }
                    }
                }
            }
        }
        Some(_) => report.error(format!("{}.checks must be an object", path)),
    }
}

/// Validate one check; returns its name when it is a string.
fn validate_check<'a>(check: &'a Json, path: &str, report: &mut ValidationReport) -> Option<&'a str> {
    let Some(check) = check.as_object() else {
        report.error(format!("{} must be an object", path));
        return None;
    };

    let name = required_string(check, "name", path, report);
    required_string(check, "command", path, report);

    match check.get("args") {
        Some(Json::Array(args)) => {
            let mut all_strings = true;
            for (i, a) in args.iter().enumerate() {
                if !a.is_string() {
                    all_strings = false;
                    report.error(format!("{}.args[{}] must be a string", path, i));
                }
            }
            let has_placeholder = args
                .iter()
                .filter_map(Json::as_str)
                .any(|a| a.contains(FILE_PLACEHOLDER));
            if all_strings && !has_placeholder {
                report.error(format!(
                    "{}.args must contain the {} placeholder",
                    path, FILE_PLACEHOLDER
                ));
            }
        }
        Some(_) => report.error(format!("{}.args must be an array of strings", path)),
        None => report.error(format!(
            "{}.args is required and must contain the {} placeholder",
            path, FILE_PLACEHOLDER
        )),
    }

    match check.get("parser") {
        None => {}
        Some(Json::String(p)) => {
            if !PARSER_NAMES.contains(&p.as_str()) {
                report.error(format!(
                    "{}.parser '{}' is not a known parser (valid: {})",
                    path,
                    p,
                    PARSER_NAMES.join(", ")
                ));
            }
        }
        Some(Json::Object(spec)) => validate_regex_parser(spec, &format!("{}.parser", path), report),
        Some(_) => report.error(format!(
            "{}.parser must be a parser name or an object with a pattern",
            path
        )),
    }

    if let Some(max) = check.get("maxDiagnostics") {
        if !max.as_u64().is_some_and(|n| n > 0) {
            report.error(format!("{}.maxDiagnostics must be a positive integer", path));
        }
    }

    if let Some(auto) = check.get("auto") {
        if !auto.is_boolean() {
            report.error(format!("{}.auto must be a boolean", path));
        }
    }

    name
}

fn validate_regex_parser(spec: &Map<String, Json>, path: &str, report: &mut ValidationReport) {
    match spec.get("pattern") {
        Some(Json::String(pattern)) => match Regex::new(pattern) {
            Ok(re) => {
                if !re.capture_names().any(|n| n.is_some()) {
                    report.warn(format!(
                        "{}.pattern has no named capture groups and will never produce diagnostics",
                        path
                    ));
                }
            }
            Err(e) => report.error(format!("{}.pattern is not a valid regex: {}", path, e)),
        },
        Some(_) => report.error(format!("{}.pattern must be a string", path)),
        None => report.error(format!("{}.pattern is required", path)),
    }
    match spec.get("severity") {
        None => {}
        Some(Json::String(s)) if s == "error" || s == "warning" => {}
        Some(_) => report.error(format!(
            "{}.severity must be \"error\" or \"warning\"",
            path
        )),
    }
}

fn validate_tasks(tasks: &[Json], report: &mut ValidationReport) {
    let mut exact = HashSet::new();
    for (i, task) in tasks.iter().enumerate() {
        let path = format!("tasks[{}]", i);
        let Some(task) = task.as_object() else {
            report.error(format!("{} must be an object", path));
            continue;
        };
        required_string(task, "name", &path, report);

        if let Some(pattern) = required_string(task, "match", &path, report) {
            let body = pattern.strip_prefix('*').unwrap_or(pattern);
            if body.contains('*') {
                report.warn(format!(
                    "{}.match '{}' has a '*' that is not leading; it is matched literally",
                    path, pattern
                ));
            }
            if !pattern.starts_with('*') && !exact.insert(pattern.to_string()) {
                report.warn(format!(
                    "{}.match '{}' repeats an earlier exact match and is never used",
                    path, pattern
                ));
            }
        }

        let action = match task.get("action") {
            Some(Json::String(a)) => match a.as_str() {
                "skip" => Some(TaskAction::Skip),
                "message" => Some(TaskAction::Message),
                "review" => Some(TaskAction::Review),
                _ => {
                    report.error(format!(
                        "{}.action '{}' must be one of: {}",
                        path,
                        a,
                        TaskAction::NAMES.join(", ")
                    ));
                    None
                }
            },
            Some(_) => {
                report.error(format!("{}.action must be a string", path));
                None
            }
            None => {
                report.error(format!(
                    "{}.action is required (one of: {})",
                    path,
                    TaskAction::NAMES.join(", ")
                ));
                None
            }
        };

        let message = task.get("message");
        if let Some(m) = message {
            if !m.is_string() {
                report.error(format!("{}.message must be a string", path));
            }
        }
        match action {
            Some(TaskAction::Skip) if message.is_some() => report.error(format!(
                "{}.message is not allowed when action is skip",
                path
            )),
            Some(a @ (TaskAction::Message | TaskAction::Review)) if message.is_none() => report
                .error(format!(
                    "{}.message is required when action is {}",
                    path,
                    a.as_str()
                )),
            _ => {}
        }
    }
}

fn required_string<'a>(
    obj: &'a Map<String, Json>,
    key: &str,
    path: &str,
    report: &mut ValidationReport,
) -> Option<&'a str> {
    match obj.get(key) {
        Some(Json::String(s)) => Some(s.as_str()),
        Some(_) => {
            report.error(format!("{}.{} must be a string", path, key));
            None
        }
        None => {
            report.error(format!("{}.{} is required", path, key));
            None
        }
    }
}

fn string_array(obj: &Map<String, Json>, key: &str, path: &str, report: &mut ValidationReport) {
    match obj.get(key) {
        None => {}
        Some(Json::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_string() {
                    report.error(format!("{}.{}[{}] must be a string", path, key, i));
                }
            }
        }
        Some(_) => report.error(format!("{}.{} must be an array of strings", path, key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc_with_check(check: Json) -> Json {
        json!({"environments": [{"name": "py", "paths": ["."], "checks": {".py": [check]}}]})
    }

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "environments": [{
                "name": "api",
                "paths": ["services/api"],
                "excludes": ["**/*.gen.py"],
                "checks": {".py": [
                    {"name": "ruff", "command": "ruff", "args": ["check", "{file}"], "parser": "ruff", "maxDiagnostics": 3, "auto": true},
                    {"name": "custom", "command": "x", "args": ["--path={file}"],
                     "parser": {"pattern": "^(?P<line>\\d+): (?P<message>.+)$", "severity": "warning"}}
                ]}
            }],
            "tasks": [
                {"name": "tests", "match": "test-engineer", "action": "skip"},
                {"name": "review", "match": "*-engineer", "action": "review", "message": "Invoke *-reviewer"}
            ],
            "git": {"merge": true}
        });
        let r = validate(&doc);
        assert_eq!(r, ValidationReport::default());
        assert!(r.is_valid());
    }

    #[test]
    fn test_missing_placeholder_is_exactly_one_error() {
        let r = validate(&doc_with_check(
            json!({"name": "ruff", "command": "ruff", "args": ["check", "."]}),
        ));
        assert_eq!(
            r.errors,
            vec!["environments[0].checks[\".py\"][0].args must contain the {file} placeholder"]
        );
    }

    #[test]
    fn test_placeholder_may_be_embedded() {
        let r = validate(&doc_with_check(
            json!({"name": "fmt", "command": "fmt", "args": ["--stdin-filename={file}"]}),
        ));
        assert!(r.is_valid());
    }

    #[test]
    fn test_unknown_parser_is_exactly_one_error_listing_names() {
        let r = validate(&doc_with_check(
            json!({"name": "x", "command": "x", "args": ["{file}"], "parser": "unknown-name"}),
        ));
        assert_eq!(r.errors.len(), 1);
        assert!(r.errors[0].starts_with("environments[0].checks[\".py\"][0].parser 'unknown-name'"));
        for name in PARSER_NAMES {
            assert!(r.errors[0].contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_regex_parser_rules() {
        let r = validate(&doc_with_check(json!({
            "name": "x", "command": "x", "args": ["{file}"],
            "parser": {"pattern": "(unclosed", "severity": "info"}
        })));
        assert_eq!(r.errors.len(), 2);
        assert!(r.errors[0].contains("parser.pattern is not a valid regex"));
        assert!(r.errors[1].contains("parser.severity must be"));

        let r = validate(&doc_with_check(json!({
            "name": "x", "command": "x", "args": ["{file}"], "parser": {"pattern": "^(\\d+):"}
        })));
        assert!(r.is_valid());
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].contains("no named capture groups"));
    }

    #[test]
    fn test_check_field_types() {
        let r = validate(&doc_with_check(json!({
            "name": 3, "args": ["{file}"], "maxDiagnostics": 0, "auto": "yes"
        })));
        assert_eq!(
            r.errors,
            vec![
                "environments[0].checks[\".py\"][0].name must be a string",
                "environments[0].checks[\".py\"][0].command is required",
                "environments[0].checks[\".py\"][0].maxDiagnostics must be a positive integer",
                "environments[0].checks[\".py\"][0].auto must be a boolean",
            ]
        );
    }

    #[test]
    fn test_environment_structure() {
        let doc = json!({
            "environments": [
                {"name": "a", "paths": [], "checks": {".py": "ruff"}},
                {"name": "a", "paths": ["x", 1], "excludes": "dist", "root": 7}
            ],
            "extra": true
        });
        let r = validate(&doc);
        assert_eq!(
            r.errors,
            vec![
                "environments[0].paths must be a non-empty array of strings",
                "environments[0].checks[\".py\"] must be an array of checks",
                "environments[1].name 'a' is used by more than one environment",
                "environments[1].paths[1] must be a string",
                "environments[1].excludes must be an array of strings",
                "environments[1].root must be a string",
            ]
        );
        assert_eq!(
            r.warnings,
            vec![
                "unknown top-level key 'extra' is ignored",
                "environments[1] has no checks",
            ]
        );
    }

    #[test]
    fn test_top_level_shape() {
        assert_eq!(validate(&json!([])).errors, vec!["configuration must be a JSON object"]);
        assert_eq!(validate(&json!({})).errors, vec!["environments is required"]);
        assert_eq!(
            validate(&json!({"environments": []})).errors,
            vec!["environments must not be empty"]
        );
    }

    #[test]
    fn test_task_rules() {
        let doc = json!({
            "environments": [{"paths": ["."], "checks": {}}],
            "tasks": [
                {"name": "a", "match": "x", "action": "skip", "message": "no"},
                {"name": "b", "match": "*-eng", "action": "review"},
                {"name": "c", "match": "y", "action": "shout"},
                {"match": "x", "action": "message", "message": "m"},
                {"name": "e", "match": "a*b", "action": "skip"}
            ]
        });
        let r = validate(&doc);
        assert_eq!(
            r.errors,
            vec![
                "tasks[0].message is not allowed when action is skip",
                "tasks[1].message is required when action is review",
                "tasks[2].action 'shout' must be one of: skip, message, review",
                "tasks[3].name is required",
            ]
        );
        assert_eq!(
            r.warnings,
            vec![
                "environments[0] has no checks",
                "tasks[3].match 'x' repeats an earlier exact match and is never used",
                "tasks[4].match 'a*b' has a '*' that is not leading; it is matched literally",
            ]
        );
    }

    #[test]
    fn test_empty_check_list_warns() {
        let doc = json!({"environments": [{"name": "py", "paths": ["."], "checks": {".py": []}}]});
        let r = validate(&doc);
        assert!(r.is_valid());
        assert_eq!(
            r.warnings,
            vec![r#"environments[0].checks[".py"] is empty; .py files are not checked"#]
        );
    }

    #[test]
    fn test_git_flags() {
        let doc = json!({
            "environments": [{"paths": ["."], "checks": {".py": [{"name": "r", "command": "r", "args": ["{file}"]}]}}],
            "git": {"merge": "yes", "stash": true}
        });
        let r = validate(&doc);
        assert_eq!(r.errors, vec!["git.merge must be a boolean"]);
        assert_eq!(r.warnings.len(), 1);
        assert!(r.warnings[0].starts_with("git.stash is not a known repository state"));
    }

    #[test]
    fn test_validate_str_reports_position() {
        let r = validate_str("{\n  \"environments\": [\n}");
        assert_eq!(r.errors.len(), 1);
        assert!(r.errors[0].starts_with("invalid JSON at line 3, column "));
    }
}
