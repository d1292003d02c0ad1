//! Hook Registry
//!
//! Contains:
//! - `Hook` trait - for implementing hooks
//! - `HookMatcher` - matches tools by name pattern and carries run limits
//! - `HookRegistry` - stores hooks per phase

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::core::{GuardError, GuardResult};

use super::command_hook::CommandHook;
use super::registration::{HookRegistration, DEFAULT_HOOK_TIMEOUT_SECS};
use super::types::{HookPhase, HookRequest, HookResponse};

/// Trait for hook implementations
///
/// A hook receives its own copy of the request and must not rely on
/// side effects of other hooks registered for the same phase.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> &str;

    /// Evaluate one request
    async fn invoke(&self, request: HookRequest) -> GuardResult<HookResponse>;
}

/// Type alias for stored hooks
pub type ArcHook = Arc<dyn Hook>;

/// Hook backed by a synchronous closure
pub struct FnHook<F> {
    name: String,
    func: F,
}

impl<F> FnHook<F>
where
    F: Fn(&HookRequest) -> HookResponse + Send + Sync,
{
    /// Wrap a closure
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> Hook for FnHook<F>
where
    F: Fn(&HookRequest) -> HookResponse + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: HookRequest) -> GuardResult<HookResponse> {
        Ok((self.func)(&request))
    }
}

/// Matches tools by name pattern and executes a hook
#[derive(Clone)]
pub struct HookMatcher {
    /// Anchored pattern for tool names (None = match all)
    pattern: Option<Regex>,

    /// The hook to execute
    hook: ArcHook,

    /// Disabled matchers stay registered but never run
    enabled: bool,

    /// Time limit for one invocation
    timeout: Duration,
}

impl HookMatcher {
    /// Create a matcher that matches all tools
    pub fn new<H: Hook + 'static>(hook: H) -> Self {
        Self::from_arc(Arc::new(hook))
    }

    /// Create a matcher around a shared hook
    pub fn from_arc(hook: ArcHook) -> Self {
        Self {
            pattern: None,
            hook,
            enabled: true,
            timeout: Duration::from_secs(DEFAULT_HOOK_TIMEOUT_SECS),
        }
    }

    /// Create a matcher with a tool name pattern
    ///
    /// The pattern must match the whole tool name:
    /// - `"Bash"` - only Bash, not `BashOutput`
    /// - `"Write|Edit|MultiEdit"` - file tools
    /// - `""` or `"*"` - every tool
    pub fn with_pattern<H: Hook + 'static>(pattern: &str, hook: H) -> GuardResult<Self> {
        Self::new(hook).pattern(pattern)
    }

    /// Replace the tool name pattern
    pub fn pattern(mut self, pattern: &str) -> GuardResult<Self> {
        let pattern = pattern.trim();
        self.pattern = if pattern.is_empty() || pattern == "*" {
            None
        } else {
            Some(compile_tool_pattern(pattern)?)
        };
        Ok(self)
    }

    /// Set the time limit
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable the matcher
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if this matcher applies to a tool name
    pub fn matches(&self, tool_name: &str) -> bool {
        match &self.pattern {
            Some(regex) => regex.is_match(tool_name),
            None => true,
        }
    }

    /// Shared handle to the hook
    pub fn hook(&self) -> ArcHook {
        Arc::clone(&self.hook)
    }

    /// Hook name
    pub fn name(&self) -> &str {
        self.hook.name()
    }

    /// Time limit for one invocation
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the matcher runs
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Tool names are case-sensitive and matched in full
fn compile_tool_pattern(pattern: &str) -> GuardResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| GuardError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

impl std::fmt::Debug for HookMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookMatcher")
            .field("hook", &self.hook.name())
            .field("pattern", &self.pattern.as_ref().map(|r| r.as_str()))
            .field("enabled", &self.enabled)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Central registry for all hooks
///
/// # Example
///
/// ```ignore
/// let mut hooks = HookRegistry::new();
///
/// hooks.add_with_pattern(
///     HookPhase::PreToolUse,
///     "Bash",
///     FnHook::new("no-rm", |req: &HookRequest| {
///         if req.command().unwrap_or("").contains("rm -rf") {
///             HookResponse::block("Dangerous command blocked")
///         } else {
///             HookResponse::approve()
///         }
///     }),
/// )?;
/// ```
#[derive(Default, Clone)]
pub struct HookRegistry {
    hooks: HashMap<HookPhase, Vec<HookMatcher>>,
}

impl HookRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of command hooks from parsed registrations
    ///
    /// A registration whose matcher does not compile is dropped and logged.
    pub fn from_registrations(registrations: &[HookRegistration]) -> Self {
        let mut registry = Self::new();
        for registration in registrations {
            let hook = CommandHook::new(&registration.command);
            match HookMatcher::with_pattern(&registration.matcher, hook) {
                Ok(matcher) => {
                    let matcher = matcher
                        .with_enabled(registration.enabled)
                        .with_timeout(registration.timeout());
                    registry.add_matcher(registration.phase, matcher);
                }
                Err(e) => {
                    tracing::error!(
                        "[HookRegistry] Dropping {} hook '{}': {}",
                        registration.phase,
                        registration.command,
                        e
                    );
                }
            }
        }
        registry
    }

    /// Add a hook that matches all tools
    pub fn add<H: Hook + 'static>(&mut self, phase: HookPhase, hook: H) -> &mut Self {
        self.hooks
            .entry(phase)
            .or_default()
            .push(HookMatcher::new(hook));
        self
    }

    /// Add a hook with a tool name pattern
    pub fn add_with_pattern<H: Hook + 'static>(
        &mut self,
        phase: HookPhase,
        pattern: &str,
        hook: H,
    ) -> GuardResult<&mut Self> {
        self.hooks
            .entry(phase)
            .or_default()
            .push(HookMatcher::with_pattern(pattern, hook)?);
        Ok(self)
    }

    /// Add a pre-built matcher
    pub fn add_matcher(&mut self, phase: HookPhase, matcher: HookMatcher) -> &mut Self {
        self.hooks.entry(phase).or_default().push(matcher);
        self
    }

    /// Check if there are any hooks for a phase
    pub fn has_hooks(&self, phase: HookPhase) -> bool {
        self.hooks
            .get(&phase)
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }

    /// Get the number of hooks for a phase
    pub fn hook_count(&self, phase: HookPhase) -> usize {
        self.hooks.get(&phase).map(|v| v.len()).unwrap_or(0)
    }

    /// Enabled matchers of `phase` that apply to `tool_name`
    pub fn matching(&self, phase: HookPhase, tool_name: &str) -> Vec<&HookMatcher> {
        self.hooks
            .get(&phase)
            .map(|matchers| {
                matchers
                    .iter()
                    .filter(|m| m.is_enabled() && m.matches(tool_name))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (phase, matchers) in &self.hooks {
            map.entry(phase, &matchers.len());
        }
        map.finish()
    }
}
