//! Hooks Module
//!
//! Intercept tool invocations of a coding assistant before and after they
//! run.
//!
//! # Overview
//!
//! - `HookRegistry` stores hooks per phase, each behind a tool name matcher
//! - `Dispatcher` runs all matching hooks concurrently and merges the result
//! - Built-in hooks: file guard, command validator, auto-formatter
//! - `CommandHook` runs any registered shell command over the JSON protocol
//!
//! # Example
//!
//! ```ignore
//! use buddy_guard::hooks::{builtin_registry, Dispatcher, HookPhase, HookRequest};
//!
//! let snapshot = Arc::new(PolicySnapshot::default());
//! let dispatcher = Dispatcher::new(builtin_registry(snapshot, None));
//!
//! let request = HookRequest::new("Bash").with_param("command", "rm -rf /");
//! let decision = dispatcher.dispatch(HookPhase::PreToolUse, &request).await;
//! assert!(!decision.approved);
//! ```
//!
//! # Phases
//!
//! | Phase | When | Can block |
//! |-------|------|-----------|
//! | `PreToolUse` | Before the tool executes | yes |
//! | `PostToolUse` | After the tool succeeds | no, advisory only |

mod builtin;
mod command_hook;
mod dispatcher;
mod registration;
mod registry;
mod types;

pub use builtin::{
    builtin_registry, AutoFormatHook, CommandValidatorHook, FileGuardHook, AUTO_FORMAT,
    COMMAND_VALIDATOR, FILE_GUARD, FORMAT_TOOLS,
};
pub use command_hook::CommandHook;
pub use dispatcher::{load_failure_response, merge, Decision, Dispatcher, HookOutcome, HookReport};
pub use registration::{
    load_registrations, parse_registrations, HookRegistration, DEFAULT_HOOK_TIMEOUT_SECS,
};
pub use registry::{ArcHook, FnHook, Hook, HookMatcher, HookRegistry};
pub use types::{
    HookPhase, HookRequest, HookResponse, EXIT_APPROVED, EXIT_BLOCKED, EXIT_NON_BLOCKING_ERROR,
};
