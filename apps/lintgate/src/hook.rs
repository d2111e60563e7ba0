//! Hook wire protocol: the JSON payload read from stdin and the response
//! written to stdout.

use crate::gate::Outcome;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::io::{self, Read};
use std::path::PathBuf;

/// Upper bound on the stdin payload.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
/// Inbound hook payload. Only the fields lintgate acts on are modelled; the
/// rest of the host's payload is ignored.
pub struct HookInput {
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<Json>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub subagent_type: Option<String>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
}

/// What a payload asks lintgate to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    FileEdited(String),
    TaskCompleted(String),
    /// Neither a file path nor an agent identifier was present.
    Other,
}

impl HookInput {
    fn tool_input_str(&self, key: &str) -> Option<&str> {
        self.tool_input
            .as_ref()?
            .get(key)?
            .as_str()
            .filter(|s| !s.is_empty())
    }

    /// Edited file: `tool_input.file_path`, then `tool_input.notebook_path`,
    /// then a top-level `file_path`.
    pub fn file_path(&self) -> Option<&str> {
        self.tool_input_str("file_path")
            .or_else(|| self.tool_input_str("notebook_path"))
            .or_else(|| self.file_path.as_deref().filter(|s| !s.is_empty()))
    }

    /// Sub-agent identifier: `tool_input.subagent_type`, then top-level
    /// `subagent_type`, then `agent_type`.
    pub fn subagent(&self) -> Option<&str> {
        self.tool_input_str("subagent_type")
            .or_else(|| self.subagent_type.as_deref().filter(|s| !s.is_empty()))
            .or_else(|| self.agent_type.as_deref().filter(|s| !s.is_empty()))
    }

    pub fn event(&self) -> HookEvent {
        if let Some(path) = self.file_path() {
            HookEvent::FileEdited(path.to_string())
        } else if let Some(agent) = self.subagent() {
            HookEvent::TaskCompleted(agent.to_string())
        } else {
            HookEvent::Other
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HookReadError {
    #[error("failed to read hook input: {0}")]
    Io(#[from] io::Error),
    #[error("hook input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("hook input exceeds {max} bytes")]
    TooLarge { max: usize },
}

/// Read and parse a payload from `reader`, refusing more than `max_bytes`.
pub fn read_hook_input_from<R: Read>(reader: R, max_bytes: usize) -> Result<HookInput, HookReadError> {
    let mut input = String::with_capacity(256);
    reader.take((max_bytes as u64).saturating_add(1)).read_to_string(&mut input)?;
    if input.len() > max_bytes {
        return Err(HookReadError::TooLarge { max: max_bytes });
    }
    Ok(serde_json::from_str(&input)?)
}

pub fn read_hook_input(max_bytes: usize) -> Result<HookInput, HookReadError> {
    read_hook_input_from(io::stdin().lock(), max_bytes)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Outbound response printed on stdout.
pub struct HookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
}

impl HookResponse {
    /// Response for an outcome; `None` means stay silent.
    pub fn from_outcome(outcome: &Outcome) -> Option<Self> {
        match outcome {
            Outcome::Block { reason } => Some(Self {
                decision: Some("block"),
                reason: Some(reason.clone()),
                system_message: None,
            }),
            Outcome::Continue { status: Some(s) } => Some(Self {
                decision: None,
                reason: None,
                system_message: Some(s.clone()),
            }),
            Outcome::Continue { status: None } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(v: Json) -> HookInput {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_file_path_precedence() {
        let i = input(json!({
            "tool_name": "Edit",
            "tool_input": {"file_path": "/p/a.py", "notebook_path": "/p/n.ipynb"},
            "file_path": "/p/top.py"
        }));
        assert_eq!(i.event(), HookEvent::FileEdited("/p/a.py".into()));

        let i = input(json!({"tool_input": {"notebook_path": "/p/n.ipynb"}, "file_path": "/p/top.py"}));
        assert_eq!(i.file_path(), Some("/p/n.ipynb"));

        let i = input(json!({"file_path": "/p/top.py", "session_id": "x"}));
        assert_eq!(i.file_path(), Some("/p/top.py"));
    }

    #[test]
    fn test_subagent_precedence() {
        let i = input(json!({"tool_input": {"subagent_type": "python-engineer"}, "agent_type": "other"}));
        assert_eq!(i.event(), HookEvent::TaskCompleted("python-engineer".into()));
        let i = input(json!({"subagent_type": "", "agent_type": "test-engineer"}));
        assert_eq!(i.subagent(), Some("test-engineer"));
        assert_eq!(input(json!({"tool_name": "Bash"})).event(), HookEvent::Other);
    }

    #[test]
    fn test_bounded_read() {
        let payload = br#"{"file_path": "a.py", "cwd": "/repo"}"#;
        let i = read_hook_input_from(&payload[..], 1024).unwrap();
        assert_eq!(i.cwd, Some(PathBuf::from("/repo")));
        assert!(matches!(
            read_hook_input_from(&payload[..], 10),
            Err(HookReadError::TooLarge { max: 10 })
        ));
        assert!(matches!(
            read_hook_input_from(&b"not json"[..], 1024),
            Err(HookReadError::Json(_))
        ));
    }

    #[test]
    fn test_unbounded_limit_reads_payload() {
        let payload = br#"{"hook_event_name": "PostToolUse", "tool_name": "Edit", "file_path": "a.py"}"#;
        let i = read_hook_input_from(&payload[..], usize::MAX).unwrap();
        assert_eq!(i.hook_event_name.as_deref(), Some("PostToolUse"));
        assert_eq!(i.tool_name.as_deref(), Some("Edit"));
        assert_eq!(i.event(), HookEvent::FileEdited("a.py".into()));
    }

    #[test]
    fn test_response_shapes() {
        let block = HookResponse::from_outcome(&Outcome::Block {
            reason: "ruff failed".into(),
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"decision": "block", "reason": "ruff failed"})
        );
        let status = HookResponse::from_outcome(&Outcome::Continue {
            status: Some("ruff ✓".into()),
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"systemMessage": "ruff ✓"})
        );
        assert_eq!(HookResponse::from_outcome(&Outcome::Continue { status: None }), None);
    }
}
