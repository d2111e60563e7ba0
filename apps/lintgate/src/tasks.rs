//! Routing of completed sub-tasks to skip / message / review actions.

use crate::models::rules::{TaskAction, TaskRule};

#[derive(Debug, Clone, PartialEq)]
/// A rule selected for an identifier, with the wildcard capture if any.
pub struct TaskMatch<'a> {
    pub rule: &'a TaskRule,
    pub capture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Routing decision for one sub-agent identifier.
pub enum TaskOutcome {
    /// Matched a `skip` rule; nothing is reported.
    Skip { rule: String },
    /// Non-blocking advisory text.
    Advise { rule: String, message: String },
    /// Blocking reason; the flow waits for a review.
    Review { rule: String, message: String },
    NoMatch,
}

/// Find the rule for `identifier`.
///
/// Exact matches are tried over the whole list first, so an exact rule wins
/// even when a wildcard rule is declared before it. Only then are `*<suffix>`
/// rules tried in declaration order; the prefix before the suffix is captured.
pub fn find_match<'a>(rules: &'a [TaskRule], identifier: &str) -> Option<TaskMatch<'a>> {
    if let Some(rule) = rules.iter().find(|r| r.pattern == identifier) {
        return Some(TaskMatch {
            rule,
            capture: None,
        });
    }
    rules.iter().find_map(|rule| {
        let suffix = rule.pattern.strip_prefix('*')?;
        let prefix = identifier.strip_suffix(suffix)?;
        Some(TaskMatch {
            rule,
            capture: Some(prefix.to_string()),
        })
    })
}

/// Substitute the capture for every `*` and `$1` in `template`.
pub fn render_message(template: &str, capture: Option<&str>) -> String {
    match capture {
        Some(c) => template.replace("$1", c).replace('*', c),
        None => template.to_string(),
    }
}

/// Map `identifier` to its routing outcome.
pub fn route(rules: &[TaskRule], identifier: &str) -> TaskOutcome {
    let Some(m) = find_match(rules, identifier) else {
        log::debug!("no task rule for '{}'", identifier);
        return TaskOutcome::NoMatch;
    };
    let rule = m.rule.name.clone();
    log::debug!(
        "task '{}' matched rule '{}' ({})",
        identifier,
        rule,
        m.rule.action.as_str()
    );
    let message = || {
        render_message(
            m.rule.message.as_deref().unwrap_or_default(),
            m.capture.as_deref(),
        )
    };
    match m.rule.action {
        TaskAction::Skip => TaskOutcome::Skip { rule },
        TaskAction::Message => TaskOutcome::Advise {
            rule,
            message: message(),
        },
        TaskAction::Review => TaskOutcome::Review {
            rule,
            message: message(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, pattern: &str, action: TaskAction, message: Option<&str>) -> TaskRule {
        TaskRule {
            name: name.into(),
            pattern: pattern.into(),
            action,
            message: message.map(str::to_string),
        }
    }

    fn engineer_rules() -> Vec<TaskRule> {
        vec![
            rule("tests", "test-engineer", TaskAction::Skip, None),
            rule(
                "review",
                "*-engineer",
                TaskAction::Review,
                Some("Invoke *-reviewer"),
            ),
        ]
    }

    #[test]
    fn test_wildcard_captures_prefix() {
        let rules = engineer_rules();
        let m = find_match(&rules, "python-engineer").unwrap();
        assert_eq!(m.rule.name, "review");
        assert_eq!(m.capture.as_deref(), Some("python"));
        assert_eq!(
            route(&rules, "python-engineer"),
            TaskOutcome::Review {
                rule: "review".into(),
                message: "Invoke python-reviewer".into()
            }
        );
    }

    #[test]
    fn test_exact_match_wins_over_earlier_wildcard() {
        let mut rules = engineer_rules();
        rules.reverse();
        let m = find_match(&rules, "test-engineer").unwrap();
        assert_eq!(m.rule.name, "tests");
        assert_eq!(m.capture, None);
        assert_eq!(
            route(&rules, "test-engineer"),
            TaskOutcome::Skip {
                rule: "tests".into()
            }
        );
    }

    #[test]
    fn test_first_wildcard_in_declaration_order() {
        let rules = vec![
            rule("a", "*-engineer", TaskAction::Message, Some("A $1")),
            rule("b", "*engineer", TaskAction::Message, Some("B $1")),
        ];
        assert_eq!(
            route(&rules, "go-engineer"),
            TaskOutcome::Advise {
                rule: "a".into(),
                message: "A go".into()
            }
        );
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let rules = engineer_rules();
        assert!(find_match(&rules, "Python-Engineer").is_none());
        assert_eq!(route(&rules, "planner"), TaskOutcome::NoMatch);
    }

    #[test]
    fn test_render_message() {
        assert_eq!(render_message("Ask * ($1) again", Some("rust")), "Ask rust (rust) again");
        assert_eq!(render_message("Literal * and $1", None), "Literal * and $1");
    }

    #[test]
    fn test_exact_match_leaves_template_untouched() {
        let rules = vec![rule(
            "docs",
            "docs-writer",
            TaskAction::Message,
            Some("Check * links"),
        )];
        assert_eq!(
            route(&rules, "docs-writer"),
            TaskOutcome::Advise {
                rule: "docs".into(),
                message: "Check * links".into()
            }
        );
    }
}
