//! Hook Types
//!
//! Core types for the hook protocol:
//! - `HookPhase` - when a hook runs relative to the tool operation
//! - `HookRequest` - JSON envelope sent to a hook
//! - `HookResponse` - JSON envelope returned by a hook

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Exit code: operation approved
pub const EXIT_APPROVED: i32 = 0;
/// Exit code: non-blocking error, log and continue
pub const EXIT_NON_BLOCKING_ERROR: i32 = 1;
/// Exit code: operation denied
pub const EXIT_BLOCKED: i32 = 2;

/// Hook execution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HookPhase {
    /// Before the tool executes - can block
    PreToolUse,
    /// After the tool succeeds - advisory only
    PostToolUse,
}

impl HookPhase {
    /// Parse a phase key as used in registration files
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "PreToolUse" => Some(HookPhase::PreToolUse),
            "PostToolUse" => Some(HookPhase::PostToolUse),
            _ => None,
        }
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookPhase::PreToolUse => write!(f, "PreToolUse"),
            HookPhase::PostToolUse => write!(f, "PostToolUse"),
        }
    }
}

/// Request envelope: which tool is being invoked and with what parameters
///
/// Accepts both `tool`/`parameters` and the assistant's native
/// `tool_name`/`tool_input` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookRequest {
    /// Tool name (e.g. `Write`, `Bash`)
    #[serde(alias = "tool_name")]
    pub tool: String,

    /// Tool parameters
    #[serde(default, alias = "tool_input")]
    pub parameters: Map<String, Value>,
}

impl HookRequest {
    /// Create a request with no parameters
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            parameters: Map::new(),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Get a string parameter
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(|v| v.as_str())
    }

    /// Target file of a file-editing tool
    pub fn file_path(&self) -> Option<&str> {
        self.str_param("file_path")
            .or_else(|| self.str_param("notebook_path"))
            .filter(|p| !p.trim().is_empty())
    }

    /// Command of a shell tool
    pub fn command(&self) -> Option<&str> {
        self.str_param("command").filter(|c| !c.trim().is_empty())
    }
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResponse {
    /// Whether the operation may proceed
    pub approved: bool,

    /// Reason (when blocked) or advisory note (when approved)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Actionable suggestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Structured details (matched pattern, severity, formatter, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl HookResponse {
    /// Approve silently
    pub fn approve() -> Self {
        Self {
            approved: true,
            message: None,
            suggestion: None,
            details: None,
        }
    }

    /// Approve with an advisory message
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::approve()
        }
    }

    /// Deny with a reason
    pub fn block(message: impl Into<String>) -> Self {
        Self {
            approved: false,
            message: Some(message.into()),
            suggestion: None,
            details: None,
        }
    }

    /// Attach a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach details
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// Exit code for a standalone hook process
    pub fn exit_code(&self) -> i32 {
        if self.approved {
            EXIT_APPROVED
        } else {
            EXIT_BLOCKED
        }
    }
}

impl Default for HookResponse {
    fn default() -> Self {
        Self::approve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_phase_parse_and_display() {
        assert_eq!(HookPhase::parse("PreToolUse"), Some(HookPhase::PreToolUse));
        assert_eq!(HookPhase::parse("PostToolUse"), Some(HookPhase::PostToolUse));
        assert_eq!(HookPhase::parse("Stop"), None);
        assert_eq!(HookPhase::PostToolUse.to_string(), "PostToolUse");
    }

    #[test]
    fn test_request_accepts_native_keys() {
        let native: HookRequest = serde_json::from_value(json!({
            "tool_name": "Write",
            "tool_input": { "file_path": ".env", "content": "X=1" }
        }))
        .unwrap();
        let plain: HookRequest = serde_json::from_value(json!({
            "tool": "Write",
            "parameters": { "file_path": ".env", "content": "X=1" }
        }))
        .unwrap();

        assert_eq!(native, plain);
        assert_eq!(plain.file_path(), Some(".env"));
    }

    #[test]
    fn test_request_helpers() {
        let request = HookRequest::new("Bash").with_param("command", "   ");
        assert_eq!(request.command(), None);

        let request = HookRequest::new("NotebookEdit").with_param("notebook_path", "a.ipynb");
        assert_eq!(request.file_path(), Some("a.ipynb"));
    }

    #[test]
    fn test_approve_serializes_minimal() {
        let json = serde_json::to_value(HookResponse::approve()).unwrap();
        assert_eq!(json, json!({ "approved": true }));
    }

    #[test]
    fn test_response_round_trip() {
        let mut details = Map::new();
        details.insert("pattern".into(), json!(r"\.env"));
        details.insert("severity".into(), json!("block"));
        let response = HookResponse::block("Operation blocked: .env")
            .with_suggestion("Use a non-protected path")
            .with_details(details);

        let text = serde_json::to_string(&response).unwrap();
        let parsed: HookResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(HookResponse::approve().exit_code(), EXIT_APPROVED);
        assert_eq!(HookResponse::warn("slow").exit_code(), EXIT_APPROVED);
        assert_eq!(HookResponse::block("no").exit_code(), EXIT_BLOCKED);
    }
}
