//! File Guard
//!
//! Pure decision function over file paths for Write/Edit operations. File
//! contents are never read.

use std::path::Path;

use serde_json::json;

use crate::config::ProtectionPolicy;
use crate::hooks::HookResponse;
use crate::rules::{defaults, Severity};

/// Tools whose `file_path` the guard inspects
pub const FILE_WRITE_TOOLS: [&str; 4] = ["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Lexically normalise a path: unify separators, drop `.` and empty
/// segments, and resolve `..` where possible.
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&"..") | None if !absolute => parts.push(".."),
                Some(&"..") | None => {}
                Some(_) => {
                    parts.pop();
                }
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Path relative to `project_root`, if the path lies below it
fn relative_to<'a>(normalized: &'a str, project_root: Option<&str>) -> Option<&'a str> {
    let root = project_root?.trim_end_matches('/');
    normalized
        .strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|relative| !relative.is_empty())
}

/// Final path segment, if it differs from the whole path
fn file_name(normalized: &str) -> Option<&str> {
    normalized
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != normalized)
}

/// Decide whether a write to `file_path` is allowed
pub fn check_write(file_path: &str, policy: &ProtectionPolicy) -> HookResponse {
    check_write_in(file_path, policy, None)
}

/// Decide whether a write to `file_path` is allowed, also matching the path
/// relative to `project_root`
pub fn check_write_in(
    file_path: &str,
    policy: &ProtectionPolicy,
    project_root: Option<&Path>,
) -> HookResponse {
    if !policy.enabled {
        return HookResponse::approve();
    }

    let normalized = normalize_path(file_path);
    let root = project_root.map(|r| normalize_path(&r.to_string_lossy()));

    let mut subjects = vec![normalized.as_str()];
    subjects.extend(relative_to(&normalized, root.as_deref()));

    // The whitelist is checked against paths, never the bare file name.
    if policy
        .whitelist
        .is_any_whitelisted(&subjects, policy.strict_mode)
    {
        tracing::debug!("[FileGuard] {} is whitelisted", normalized);
        return HookResponse::approve();
    }

    subjects.extend(file_name(&normalized));

    let Some(rule) = policy.patterns.evaluate_any(&subjects) else {
        return HookResponse::approve();
    };

    match rule.severity {
        Severity::Block => {
            tracing::info!(
                "[FileGuard] Blocked write to {} (pattern {})",
                file_path,
                rule.pattern
            );

            let message = format!(
                "Operation blocked: '{}' matches protected pattern {}. {}",
                file_path, rule.pattern, rule.message
            );
            let suggestion = if policy.strict_mode {
                "Strict mode is on: edit this file directly in your editor, or use a non-protected path"
                    .to_string()
            } else {
                format!(
                    "Edit the file directly, use a non-protected path, or add it to file_protection.whitelist_patterns. {}",
                    defaults::file_context(file_path)
                )
            };

            let mut details = rule.details();
            details.insert("file_path".to_string(), json!(file_path));
            HookResponse::block(message)
                .with_suggestion(suggestion)
                .with_details(details)
        }
        Severity::Warn => HookResponse::warn(format!("'{}': {}", file_path, rule.message))
            .with_details(rule.details()),
    }
}
