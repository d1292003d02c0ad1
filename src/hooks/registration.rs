//! Hook registration file
//!
//! Reads the assistant's settings JSON:
//!
//! ```json
//! { "hooks": { "PreToolUse": [
//!     { "matcher": "Write", "hooks": [ { "type": "command", "command": "...", "timeout": 10 } ] }
//! ] } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::{GuardError, GuardResult};

use super::types::HookPhase;

/// Timeout applied when a registration does not set one
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 60;

/// One registered hook command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookRegistration {
    pub phase: HookPhase,
    /// Tool name pattern; empty matches every tool
    pub matcher: String,
    /// Shell command
    pub command: String,
    pub enabled: bool,
    pub timeout_seconds: u64,
}

impl HookRegistration {
    pub fn new(phase: HookPhase, matcher: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            phase,
            matcher: matcher.into(),
            command: command.into(),
            enabled: true,
            timeout_seconds: DEFAULT_HOOK_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    hooks: BTreeMap<String, Vec<MatcherGroup>>,
}

#[derive(Debug, Deserialize)]
struct MatcherGroup {
    #[serde(default)]
    matcher: String,
    #[serde(default)]
    hooks: Vec<HookEntry>,
}

#[derive(Debug, Deserialize)]
struct HookEntry {
    #[serde(default = "default_type", rename = "type")]
    kind: String,
    #[serde(default)]
    command: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    timeout: Option<u64>,
}

fn default_type() -> String {
    "command".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Parse registrations from settings JSON text
pub fn parse_registrations(text: &str) -> Result<Vec<HookRegistration>, serde_json::Error> {
    let settings: SettingsFile = serde_json::from_str(text)?;
    let mut registrations = Vec::new();

    for (phase_name, groups) in settings.hooks {
        let Some(phase) = HookPhase::parse(&phase_name) else {
            tracing::warn!("[Registration] Ignoring unsupported hook phase '{}'", phase_name);
            continue;
        };

        for group in groups {
            for entry in group.hooks {
                if entry.kind != "command" {
                    tracing::warn!(
                        "[Registration] Ignoring {} hook of type '{}'",
                        phase,
                        entry.kind
                    );
                    continue;
                }
                if entry.command.trim().is_empty() {
                    tracing::warn!("[Registration] Ignoring {} hook with empty command", phase);
                    continue;
                }

                registrations.push(HookRegistration {
                    phase,
                    matcher: group.matcher.clone(),
                    command: entry.command,
                    enabled: entry.enabled,
                    timeout_seconds: entry.timeout.unwrap_or(DEFAULT_HOOK_TIMEOUT_SECS),
                });
            }
        }
    }

    Ok(registrations)
}

/// Load registrations from a settings file
pub fn load_registrations(path: &Path) -> GuardResult<Vec<HookRegistration>> {
    let text = fs::read_to_string(path)
        .map_err(|e| GuardError::invalid_config(path, e.to_string()))?;
    let registrations =
        parse_registrations(&text).map_err(|e| GuardError::invalid_config(path, e.to_string()))?;

    tracing::debug!(
        "[Registration] Loaded {} hook(s) from {}",
        registrations.len(),
        path.display()
    );
    Ok(registrations)
}
