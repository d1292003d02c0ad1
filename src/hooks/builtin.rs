//! Built-in hooks
//!
//! The three guards wired up as `Hook` implementations. Each one holds the
//! shared read-only policy snapshot and routes on the tool name before
//! doing any work.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map};

use crate::audit::{AuditEntry, AuditLog, COMMANDS_LOG, PROTECTION_LOG};
use crate::config::PolicySnapshot;
use crate::core::GuardResult;
use crate::format::format_file_in;
use crate::guard::{check_command, check_write_in, FILE_WRITE_TOOLS, SHELL_TOOLS};

use super::registry::{Hook, HookMatcher, HookRegistry};
use super::types::{HookPhase, HookRequest, HookResponse};

/// Tools whose output the formatter rewrites
pub const FORMAT_TOOLS: [&str; 3] = ["Write", "Edit", "MultiEdit"];

pub const FILE_GUARD: &str = "file-guard";
pub const COMMAND_VALIDATOR: &str = "command-validator";
pub const AUTO_FORMAT: &str = "auto-format";

fn audit_entry(subject: &str, request: &HookRequest, response: &HookResponse, tool: &str) -> AuditEntry {
    let warnings = match (&response.message, response.approved) {
        (Some(message), true) => vec![message.clone()],
        _ => Vec::new(),
    };
    AuditEntry::new(subject, &request.tool, !response.approved, tool).with_warnings(warnings)
}

/// PreToolUse guard for file writes
#[derive(Debug, Clone)]
pub struct FileGuardHook {
    snapshot: Arc<PolicySnapshot>,
    audit: Option<AuditLog>,
    project_root: Option<PathBuf>,
}

impl FileGuardHook {
    pub fn new(snapshot: Arc<PolicySnapshot>) -> Self {
        Self {
            snapshot,
            audit: None,
            project_root: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Also match paths relative to this directory
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Evaluate a request synchronously
    pub fn check(&self, request: &HookRequest) -> HookResponse {
        if !FILE_WRITE_TOOLS.contains(&request.tool.as_str()) {
            return HookResponse::approve();
        }
        let Some(file_path) = request.file_path() else {
            return HookResponse::approve();
        };

        let response = check_write_in(
            file_path,
            &self.snapshot.file_protection,
            self.project_root.as_deref(),
        );

        if let Some(audit) = &self.audit {
            audit.record(
                PROTECTION_LOG,
                &audit_entry(file_path, request, &response, FILE_GUARD),
            );
        }
        response
    }
}

#[async_trait]
impl Hook for FileGuardHook {
    fn name(&self) -> &str {
        FILE_GUARD
    }

    async fn invoke(&self, request: HookRequest) -> GuardResult<HookResponse> {
        Ok(self.check(&request))
    }
}

/// PreToolUse guard for shell commands
#[derive(Debug, Clone)]
pub struct CommandValidatorHook {
    snapshot: Arc<PolicySnapshot>,
    audit: Option<AuditLog>,
}

impl CommandValidatorHook {
    pub fn new(snapshot: Arc<PolicySnapshot>) -> Self {
        Self {
            snapshot,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Evaluate a request synchronously
    pub fn check(&self, request: &HookRequest) -> HookResponse {
        if !SHELL_TOOLS.contains(&request.tool.as_str()) {
            return HookResponse::approve();
        }
        let Some(command) = request.command() else {
            return HookResponse::approve();
        };

        let response = check_command(command, &self.snapshot.command_validation);

        if let Some(audit) = &self.audit {
            audit.record(
                COMMANDS_LOG,
                &audit_entry(command, request, &response, COMMAND_VALIDATOR),
            );
        }
        response
    }
}

#[async_trait]
impl Hook for CommandValidatorHook {
    fn name(&self) -> &str {
        COMMAND_VALIDATOR
    }

    async fn invoke(&self, request: HookRequest) -> GuardResult<HookResponse> {
        Ok(self.check(&request))
    }
}

/// PostToolUse formatter for written files
#[derive(Debug, Clone)]
pub struct AutoFormatHook {
    snapshot: Arc<PolicySnapshot>,
    project_root: Option<PathBuf>,
}

impl AutoFormatHook {
    pub fn new(snapshot: Arc<PolicySnapshot>) -> Self {
        Self {
            snapshot,
            project_root: None,
        }
    }

    /// Resolve relative file paths against this directory
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    fn resolve(&self, file_path: &str) -> PathBuf {
        let path = Path::new(file_path);
        match &self.project_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl Hook for AutoFormatHook {
    fn name(&self) -> &str {
        AUTO_FORMAT
    }

    async fn invoke(&self, request: HookRequest) -> GuardResult<HookResponse> {
        if !FORMAT_TOOLS.contains(&request.tool.as_str()) || !self.snapshot.auto_formatting.enabled {
            return Ok(HookResponse::approve());
        }
        let Some(file_path) = request.file_path() else {
            return Ok(HookResponse::approve());
        };

        let path = self.resolve(file_path);
        let result = format_file_in(
            &path,
            self.project_root.as_deref(),
            &self.snapshot.auto_formatting,
        )
        .await?;

        let mut details = Map::new();
        details.insert("formatted".to_string(), json!(result.formatted));
        if let Some(formatter) = &result.formatter {
            details.insert("formatter".to_string(), json!(formatter));
        }

        let response = if result.formatted {
            HookResponse::warn(format!(
                "Formatted {} with {}",
                file_path,
                result.formatter.as_deref().unwrap_or("formatter")
            ))
        } else {
            if let Some(reason) = &result.skipped {
                details.insert("skipped".to_string(), json!(reason));
            }
            HookResponse::approve()
        };
        Ok(response.with_details(details))
    }
}

/// Time limit for the in-process validation hooks
const GUARD_TIMEOUT: Duration = Duration::from_secs(10);

/// Registry with the three built-in hooks
///
/// Each hook routes on the tool name itself, so all of them match every
/// tool. With a project root, relative paths resolve against it and guard
/// decisions are written to its audit log.
pub fn builtin_registry(snapshot: Arc<PolicySnapshot>, project_root: Option<&Path>) -> HookRegistry {
    let mut file_guard = FileGuardHook::new(Arc::clone(&snapshot));
    let mut command_validator = CommandValidatorHook::new(Arc::clone(&snapshot));
    let mut auto_format = AutoFormatHook::new(Arc::clone(&snapshot));

    if let Some(root) = project_root {
        let audit = AuditLog::new(root);
        file_guard = file_guard.with_project_root(root).with_audit(audit.clone());
        command_validator = command_validator.with_audit(audit);
        auto_format = auto_format.with_project_root(root);
    }

    // Leave the formatter room to hit its own timeout first.
    let format_timeout = snapshot.auto_formatting.timeout() + Duration::from_secs(5);

    let mut registry = HookRegistry::new();
    registry
        .add_matcher(
            HookPhase::PreToolUse,
            HookMatcher::new(file_guard).with_timeout(GUARD_TIMEOUT),
        )
        .add_matcher(
            HookPhase::PreToolUse,
            HookMatcher::new(command_validator).with_timeout(GUARD_TIMEOUT),
        )
        .add_matcher(
            HookPhase::PostToolUse,
            HookMatcher::new(auto_format).with_timeout(format_timeout),
        );
    registry
}
