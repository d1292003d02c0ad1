//! Policy-driven interception of coding-assistant tool calls.
//!
//! Hooks run before a tool executes (file protection, command validation)
//! and after it succeeds (auto-formatting). Each invocation loads the
//! policy once into an immutable snapshot and evaluates it against a single
//! JSON request.

pub mod core;

// Policy data and evaluation
pub mod config;
pub mod guard;
pub mod rules;

// Post-write formatting
pub mod format;

// Hook protocol, registry and dispatch
pub mod hooks;

// Diagnostics and decision trail
pub mod audit;
pub mod logging;
