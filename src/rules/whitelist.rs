//! Whitelist resolution
//!
//! Whitelist entries use the same pattern language and match mode as the
//! rules of their domain. Strict mode disables the whitelist completely.

use regex::Regex;

use super::rule::{compile_pattern, MatchMode};

/// Compiled allow-list
#[derive(Debug, Clone)]
pub struct Whitelist {
    entries: Vec<Regex>,
}

impl Whitelist {
    /// A whitelist with no entries
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Compile entries, skipping (and logging) malformed ones
    pub fn compile<S: AsRef<str>>(entries: &[S], mode: MatchMode) -> Self {
        let entries = entries
            .iter()
            .filter_map(|entry| match compile_pattern(entry.as_ref(), mode) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::error!("[Whitelist] Skipping malformed entry: {}", e);
                    None
                }
            })
            .collect();

        Self { entries }
    }

    /// Check whether `subject` is exempt
    ///
    /// Always false under strict mode.
    pub fn is_whitelisted(&self, subject: &str, strict_mode: bool) -> bool {
        self.is_any_whitelisted(&[subject], strict_mode)
    }

    /// Check whether any of `subjects` is exempt
    pub fn is_any_whitelisted(&self, subjects: &[&str], strict_mode: bool) -> bool {
        if strict_mode {
            return false;
        }

        self.entries
            .iter()
            .any(|entry| subjects.iter().any(|s| entry.is_match(s)))
    }

    /// Number of usable entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the whitelist has no usable entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::empty()
    }
}

/// One-shot whitelist check over raw entries
pub fn is_whitelisted<S: AsRef<str>>(
    subject: &str,
    whitelist: &[S],
    strict_mode: bool,
    mode: MatchMode,
) -> bool {
    if strict_mode {
        return false;
    }
    Whitelist::compile(whitelist, mode).is_whitelisted(subject, false)
}
