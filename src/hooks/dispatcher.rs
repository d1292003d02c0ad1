//! Hook Dispatcher
//!
//! Runs every matching hook of a phase concurrently, each under its own
//! timeout, and merges the responses into one decision.
//!
//! Failure policy:
//! - `PreToolUse`: a failed, timed-out or malformed hook blocks the tool
//! - `PostToolUse`: everything is advisory, nothing blocks
//! - a panicked hook task is a dispatcher error and only produces a warning

use std::time::Duration;

use futures::future::join_all;
use serde_json::{Map, Value};
use tokio::time::timeout;

use crate::core::GuardError;

use super::registry::{ArcHook, HookRegistry};
use super::types::{HookPhase, HookRequest, HookResponse, EXIT_APPROVED, EXIT_BLOCKED};

/// What happened to one hook invocation
#[derive(Debug)]
pub enum HookOutcome {
    /// The hook answered in time
    Responded(HookResponse),
    /// The hook failed, timed out, or answered with garbage
    Failed(GuardError),
    /// The hook task panicked or was cancelled
    Crashed(String),
}

/// Outcome of one hook, tagged with its name
#[derive(Debug)]
pub struct HookReport {
    pub hook: String,
    pub outcome: HookOutcome,
}

/// Merged result of a dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub approved: bool,
    /// First blocking message
    pub message: Option<String>,
    /// Suggestion attached to the first block
    pub suggestion: Option<String>,
    /// Details attached to the first block
    pub details: Option<Map<String, Value>>,
    /// Advisory messages from all hooks
    pub warnings: Vec<String>,
}

impl Decision {
    /// Approval with no annotations
    pub fn approved() -> Self {
        Self {
            approved: true,
            message: None,
            suggestion: None,
            details: None,
            warnings: Vec::new(),
        }
    }

    fn block(&mut self, message: String, suggestion: Option<String>, details: Option<Map<String, Value>>) {
        // Only the first block is reported.
        if self.approved {
            self.approved = false;
            self.message = Some(message);
            self.suggestion = suggestion;
            self.details = details;
        }
    }

    /// Convert to the wire envelope
    ///
    /// Warnings become the message of an approval.
    pub fn into_response(self) -> HookResponse {
        if self.approved {
            let message = if self.warnings.is_empty() {
                None
            } else {
                Some(self.warnings.join("\n"))
            };
            HookResponse {
                approved: true,
                message,
                suggestion: None,
                details: None,
            }
        } else {
            HookResponse {
                approved: false,
                message: self.message,
                suggestion: self.suggestion,
                details: self.details,
            }
        }
    }

    /// Exit code for the invoking process
    pub fn exit_code(&self) -> i32 {
        if self.approved {
            EXIT_APPROVED
        } else {
            EXIT_BLOCKED
        }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Self::approved()
    }
}

/// Runs registered hooks for a tool invocation
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: HookRegistry,
}

impl Dispatcher {
    pub fn new(registry: HookRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Run all matching hooks for `phase` and merge their responses
    pub async fn dispatch(&self, phase: HookPhase, request: &HookRequest) -> Decision {
        let matched = self.registry.matching(phase, &request.tool);
        if matched.is_empty() {
            tracing::debug!("[Dispatcher] No {} hooks for {}", phase, request.tool);
            return Decision::approved();
        }

        tracing::debug!(
            "[Dispatcher] Running {} {} hook(s) for {}",
            matched.len(),
            phase,
            request.tool
        );

        let runs = matched
            .into_iter()
            .map(|m| run_hook(m.hook(), m.timeout(), request.clone()));
        let reports = join_all(runs).await;

        merge(phase, reports)
    }
}

/// Run one hook on its own task, bounded by `limit`
async fn run_hook(hook: ArcHook, limit: Duration, request: HookRequest) -> HookReport {
    let name = hook.name().to_string();
    let mut handle = tokio::spawn(async move { hook.invoke(request).await });

    let outcome = match timeout(limit, &mut handle).await {
        Ok(Ok(Ok(response))) => HookOutcome::Responded(response),
        Ok(Ok(Err(e))) => HookOutcome::Failed(e),
        Ok(Err(join_error)) => HookOutcome::Crashed(join_error.to_string()),
        Err(_) => {
            // Dropping the hook future kills any child process it owns.
            handle.abort();
            HookOutcome::Failed(GuardError::HookTimeout {
                hook: name.clone(),
                timeout: limit,
            })
        }
    };

    HookReport { hook: name, outcome }
}

/// Merge hook reports according to the phase's failure policy
pub fn merge(phase: HookPhase, reports: Vec<HookReport>) -> Decision {
    let mut decision = Decision::approved();

    for report in reports {
        match (phase, report.outcome) {
            (_, HookOutcome::Responded(response)) if response.approved => {
                if let Some(message) = response.message.filter(|m| !m.trim().is_empty()) {
                    decision.warnings.push(message);
                }
            }
            (HookPhase::PreToolUse, HookOutcome::Responded(response)) => {
                let message = response
                    .message
                    .unwrap_or_else(|| format!("Blocked by hook '{}'", report.hook));
                tracing::info!("[Dispatcher] '{}' blocked: {}", report.hook, message);
                decision.block(message, response.suggestion, response.details);
            }
            (HookPhase::PostToolUse, HookOutcome::Responded(response)) => {
                // The tool already ran; a "block" here is only a report.
                let message = response
                    .message
                    .unwrap_or_else(|| "objected after the tool ran".to_string());
                decision
                    .warnings
                    .push(format!("Hook '{}': {}", report.hook, message));
            }
            (HookPhase::PreToolUse, HookOutcome::Failed(e)) => {
                tracing::warn!("[Dispatcher] {}", e);
                decision.block(
                    format!("Operation blocked because a validation hook did not complete: {}", e),
                    Some("Check the hook command and its timeout, then retry".to_string()),
                    None,
                );
            }
            (HookPhase::PostToolUse, HookOutcome::Failed(e)) => {
                tracing::warn!("[Dispatcher] {}", e);
                decision.warnings.push(e.to_string());
            }
            (_, HookOutcome::Crashed(reason)) => {
                tracing::error!("[Dispatcher] Hook '{}' crashed: {}", report.hook, reason);
                decision
                    .warnings
                    .push(format!("Hook '{}' crashed: {}", report.hook, reason));
            }
        }
    }

    decision
}

/// Response for a policy or settings file that could not be loaded
///
/// PreToolUse blocks. PostToolUse yields `None` and the caller reports the
/// error as non-blocking.
pub fn load_failure_response(phase: HookPhase, error: &GuardError) -> Option<HookResponse> {
    match phase {
        HookPhase::PreToolUse => Some(
            HookResponse::block(format!(
                "Operation blocked: hook configuration could not be loaded. {}",
                error
            ))
            .with_suggestion("Fix or remove the broken configuration file, then retry"),
        ),
        HookPhase::PostToolUse => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use crate::config::{BuddyConfig, FileProtectionConfig, PolicySnapshot};
    use crate::hooks::builtin::builtin_registry;
    use crate::hooks::{CommandHook, FnHook, HookMatcher};

    fn report(hook: &str, outcome: HookOutcome) -> HookReport {
        HookReport {
            hook: hook.to_string(),
            outcome,
        }
    }

    fn default_dispatcher() -> Dispatcher {
        Dispatcher::new(builtin_registry(Arc::new(PolicySnapshot::default()), None))
    }

    #[test]
    fn test_merge_any_block_wins() {
        for position in 0..4 {
            let reports = (0..4)
                .map(|i| {
                    let response = if i == position {
                        HookResponse::block(format!("blocked by {}", i))
                    } else {
                        HookResponse::approve()
                    };
                    report(&format!("hook-{}", i), HookOutcome::Responded(response))
                })
                .collect();
            let decision = merge(HookPhase::PreToolUse, reports);
            assert!(!decision.approved);
            assert_eq!(decision.message, Some(format!("blocked by {}", position)));
        }
    }

    #[test]
    fn test_merge_first_block_reported() {
        let reports = vec![
            report("a", HookOutcome::Responded(HookResponse::warn("slow"))),
            report(
                "b",
                HookOutcome::Responded(HookResponse::block("first").with_suggestion("fix it")),
            ),
            report("c", HookOutcome::Responded(HookResponse::block("second"))),
        ];
        let decision = merge(HookPhase::PreToolUse, reports);
        assert!(!decision.approved);
        assert_eq!(decision.message.as_deref(), Some("first"));
        assert_eq!(decision.suggestion.as_deref(), Some("fix it"));
        assert_eq!(decision.warnings, vec!["slow".to_string()]);
        assert_eq!(decision.exit_code(), EXIT_BLOCKED);
    }

    #[test]
    fn test_merge_warnings_concatenated() {
        let reports = vec![
            report("a", HookOutcome::Responded(HookResponse::warn("one"))),
            report("b", HookOutcome::Responded(HookResponse::approve())),
            report("c", HookOutcome::Responded(HookResponse::warn("two"))),
        ];
        let response = merge(HookPhase::PreToolUse, reports).into_response();
        assert!(response.approved);
        assert_eq!(response.message.as_deref(), Some("one\ntwo"));
    }

    #[test]
    fn test_merge_failure_policy() {
        let failure = || HookOutcome::Failed(GuardError::hook_failed("h", "exit 3"));

        let pre = merge(HookPhase::PreToolUse, vec![report("h", failure())]);
        assert!(!pre.approved);

        let post = merge(HookPhase::PostToolUse, vec![report("h", failure())]);
        assert!(post.approved);
        assert_eq!(post.warnings.len(), 1);

        let crashed = merge(
            HookPhase::PreToolUse,
            vec![report("h", HookOutcome::Crashed("panic".into()))],
        );
        assert!(crashed.approved);
        assert_eq!(crashed.warnings.len(), 1);
    }

    #[test]
    fn test_post_phase_never_blocks() {
        let reports = vec![report("fmt", HookOutcome::Responded(HookResponse::block("nope")))];
        let decision = merge(HookPhase::PostToolUse, reports);
        assert!(decision.approved);
        assert!(decision.warnings[0].contains("nope"));
    }

    #[test]
    fn test_unreadable_config_blocks_pre_phase() {
        let error = GuardError::invalid_config(".claude-buddy/buddy-config.json", "expected value at line 1 column 1");

        let response = load_failure_response(HookPhase::PreToolUse, &error).unwrap();
        assert!(!response.approved);
        assert_eq!(response.exit_code(), EXIT_BLOCKED);
        assert!(response.message.unwrap().contains("line 1 column 1"));
        assert!(response.suggestion.is_some());

        assert!(load_failure_response(HookPhase::PostToolUse, &error).is_none());
    }

    #[tokio::test]
    async fn test_timeout_enforced() {
        let mut registry = HookRegistry::new();
        registry.add_matcher(
            HookPhase::PreToolUse,
            HookMatcher::new(CommandHook::new("sleep 5")).with_timeout(Duration::from_secs(1)),
        );
        let dispatcher = Dispatcher::new(registry);

        let start = Instant::now();
        let decision = dispatcher
            .dispatch(HookPhase::PreToolUse, &HookRequest::new("Bash"))
            .await;

        assert!(start.elapsed() < Duration::from_secs(3));
        assert!(!decision.approved);
        assert!(decision.message.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_hooks_run_concurrently() {
        let mut registry = HookRegistry::new();
        for _ in 0..3 {
            registry.add(HookPhase::PreToolUse, CommandHook::new("cat > /dev/null; sleep 1"));
        }
        let dispatcher = Dispatcher::new(registry);

        let start = Instant::now();
        let decision = dispatcher
            .dispatch(HookPhase::PreToolUse, &HookRequest::new("Bash"))
            .await;
        assert!(decision.approved);
        assert!(start.elapsed() < Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_panicking_hook_is_warning() {
        let mut registry = HookRegistry::new();
        registry.add(
            HookPhase::PreToolUse,
            FnHook::new("boom", |_req: &HookRequest| -> HookResponse { panic!("boom") }),
        );
        let decision = Dispatcher::new(registry)
            .dispatch(HookPhase::PreToolUse, &HookRequest::new("Bash"))
            .await;
        assert!(decision.approved);
        assert_eq!(decision.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_no_matching_hooks_approves() {
        let decision = default_dispatcher()
            .dispatch(HookPhase::PreToolUse, &HookRequest::new("Read"))
            .await;
        assert_eq!(decision, Decision::approved());
    }

    #[tokio::test]
    async fn test_write_env_blocked() {
        let request = HookRequest::new("Write")
            .with_param("file_path", ".env")
            .with_param("content", "X=1");
        let response = default_dispatcher()
            .dispatch(HookPhase::PreToolUse, &request)
            .await
            .into_response();

        assert!(!response.approved);
        let message = response.message.unwrap();
        assert!(message.contains("protected pattern"));
        assert!(message.contains(".env"));
    }

    #[tokio::test]
    async fn test_write_readme_approved() {
        let request = HookRequest::new("Write")
            .with_param("file_path", "README.md")
            .with_param("content", "# Hi");
        let response = default_dispatcher()
            .dispatch(HookPhase::PreToolUse, &request)
            .await
            .into_response();
        assert_eq!(response, HookResponse::approve());
    }

    #[tokio::test]
    async fn test_rm_root_blocked() {
        let request = HookRequest::new("Bash").with_param("command", "rm -rf /");
        let decision = default_dispatcher()
            .dispatch(HookPhase::PreToolUse, &request)
            .await;
        assert!(!decision.approved);
        assert_eq!(decision.exit_code(), EXIT_BLOCKED);
    }

    #[tokio::test]
    async fn test_find_root_warns() {
        let request = HookRequest::new("Bash").with_param("command", "find / -name x");
        let response = default_dispatcher()
            .dispatch(HookPhase::PreToolUse, &request)
            .await
            .into_response();
        assert!(response.approved);
        assert!(response
            .message
            .unwrap()
            .to_lowercase()
            .contains("performance warning"));
    }

    #[tokio::test]
    async fn test_whitelist_and_strict_mode() {
        let request = HookRequest::new("Write").with_param("file_path", "test/.env.test");

        for (strict_mode, expected) in [(false, true), (true, false)] {
            let config = BuddyConfig {
                file_protection: FileProtectionConfig {
                    whitelist_patterns: vec!["test/.env.test".into()],
                    strict_mode,
                    ..Default::default()
                },
                ..Default::default()
            };
            let dispatcher = Dispatcher::new(builtin_registry(
                Arc::new(PolicySnapshot::compile(&config)),
                None,
            ));
            let decision = dispatcher.dispatch(HookPhase::PreToolUse, &request).await;
            assert_eq!(decision.approved, expected, "strict_mode={}", strict_mode);
        }
    }
}
