//! Audit trail
//!
//! Appends one JSON line per guard decision under `.claude-buddy/`. Writing
//! is best effort: failures are logged and never change a decision.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::core::GuardResult;

/// Default audit directory, relative to the project
pub const AUDIT_DIR: &str = ".claude-buddy";
/// File guard log
pub const PROTECTION_LOG: &str = "protection.log";
/// Command validator log
pub const COMMANDS_LOG: &str = "commands.log";

/// One audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the decision was made
    pub timestamp: DateTime<Local>,
    /// File path or command
    pub subject: String,
    /// Tool that was invoked
    pub action: String,
    /// Whether the operation was denied
    pub blocked: bool,
    /// Advisory messages attached to an approval
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Which guard produced the record
    pub tool: String,
}

impl AuditEntry {
    /// Create a record stamped with the current time
    pub fn new(
        subject: impl Into<String>,
        action: impl Into<String>,
        blocked: bool,
        tool: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            subject: subject.into(),
            action: action.into(),
            blocked,
            warnings: Vec::new(),
            tool: tool.into(),
        }
    }

    /// Attach warnings
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// JSONL audit writer
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    /// Audit log in `<project_dir>/.claude-buddy`
    pub fn new(project_dir: &Path) -> Self {
        Self {
            dir: project_dir.join(AUDIT_DIR),
        }
    }

    /// Audit log in an explicit directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory the logs are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append an entry to `file_name`
    pub fn append(&self, file_name: &str, entry: &AuditEntry) -> GuardResult<()> {
        fs::create_dir_all(&self.dir)?;

        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file_name))?;
        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Append an entry, logging instead of failing
    pub fn record(&self, file_name: &str, entry: &AuditEntry) {
        if let Err(e) = self.append(file_name, entry) {
            tracing::warn!("[Audit] Failed to write {}: {}", file_name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_jsonl() {
        let dir = TempDir::new().unwrap();
        let log = AuditLog::new(dir.path());

        log.record(PROTECTION_LOG, &AuditEntry::new(".env", "Write", true, "file-guard"));
        log.record(
            PROTECTION_LOG,
            &AuditEntry::new("README.md", "Write", false, "file-guard"),
        );

        let content = fs::read_to_string(dir.path().join(AUDIT_DIR).join(PROTECTION_LOG)).unwrap();
        let entries: Vec<AuditEntry> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].subject, ".env");
        assert!(entries[0].blocked);
        assert!(!entries[1].blocked);
    }

    #[test]
    fn test_record_failure_is_swallowed() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let log = AuditLog::with_dir(blocker.join("nested"));
        log.record(
            COMMANDS_LOG,
            &AuditEntry::new("ls", "Bash", false, "command-validator"),
        );
        assert!(log.append(COMMANDS_LOG, &AuditEntry::new("ls", "Bash", false, "x")).is_err());
    }
}
