//! Command Validator
//!
//! Two-tier evaluation of shell commands: the blocking tier denies, the
//! warning and suggestion tiers only annotate an approval. Blocking is
//! checked first, so a command is never both blocked and warned.

use serde_json::{json, Map, Value};

use crate::config::CommandPolicy;
use crate::hooks::HookResponse;
use crate::rules::{defaults, RuleMatch};

/// Tools whose `command` the validator inspects
pub const SHELL_TOOLS: [&str; 1] = ["Bash"];

/// Decide whether `command` may run
pub fn check_command(command: &str, policy: &CommandPolicy) -> HookResponse {
    if !policy.enabled || command.trim().is_empty() {
        return HookResponse::approve();
    }

    if policy.whitelist.is_whitelisted(command, policy.strict_mode) {
        tracing::debug!("[CommandValidator] Whitelisted command: {}", command);
        return HookResponse::approve();
    }

    if let Some(rule) = policy.blocking.evaluate(command) {
        tracing::info!(
            "[CommandValidator] Blocked command '{}': {}",
            command,
            rule.message
        );
        return block_response(command, &rule, policy.strict_mode);
    }

    let warnings = policy.warnings.matches_all(command);
    let suggestions = policy.suggestions.matches_all(command);
    if warnings.is_empty() && suggestions.is_empty() {
        return HookResponse::approve();
    }

    tracing::debug!(
        "[CommandValidator] {} warning(s), {} suggestion(s) for '{}'",
        warnings.len(),
        suggestions.len(),
        command
    );
    warning_response(command, &warnings, &suggestions)
}

fn block_response(command: &str, rule: &RuleMatch, strict_mode: bool) -> HookResponse {
    let message = format!(
        "Dangerous command blocked: '{}'. Risk: {}.",
        command, rule.message
    );

    let alternative = defaults::safer_alternative(command);
    let suggestion = if strict_mode {
        format!("{}. Strict mode is on; run it directly in your terminal if it is intended.", alternative)
    } else {
        format!(
            "{}. If the command is intended, run it directly in your terminal or add it to command_validation.whitelist_patterns.",
            alternative
        )
    };

    HookResponse::block(message)
        .with_suggestion(suggestion)
        .with_details(rule.details())
}

fn warning_response(command: &str, warnings: &[RuleMatch], suggestions: &[RuleMatch]) -> HookResponse {
    let mut lines = vec![format!("Command analysis for '{}':", command)];
    lines.extend(warnings.iter().map(|w| format!("Performance warning: {}", w.message)));
    lines.extend(suggestions.iter().map(|s| format!("Best practice: {}", s.message)));
    lines.push("Command will proceed.".to_string());

    let patterns: Vec<Value> = warnings
        .iter()
        .chain(suggestions)
        .map(|m| json!(m.pattern))
        .collect();
    let mut details = Map::new();
    details.insert("severity".to_string(), json!("warn"));
    details.insert("patterns".to_string(), Value::Array(patterns));

    HookResponse::warn(lines.join("\n")).with_details(details)
}
