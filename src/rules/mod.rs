//! Pattern rule engine
//!
//! Declarative `{pattern, message, severity}` tables compiled into ordered
//! `RuleSet`s, plus the whitelist resolver that shares their pattern
//! language.

pub mod defaults;
mod rule;
mod whitelist;

pub use rule::{compile_pattern, evaluate, MatchMode, PatternRule, RuleMatch, RuleSet, Severity};
pub use whitelist::{is_whitelisted, Whitelist};
