//! Pattern rules and compiled rule sets
//!
//! Contains:
//! - `PatternRule` - declarative `{pattern, message, severity}` entry
//! - `MatchMode` - how a compiled pattern is applied to a subject
//! - `RuleSet` - ordered, compiled rules evaluated first-match-wins

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::{GuardError, GuardResult};

/// What a matching rule does to the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Deny the operation
    Block,
    /// Annotate the approval
    Warn,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Block => write!(f, "block"),
            Severity::Warn => write!(f, "warn"),
        }
    }
}

/// A single declarative rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regular expression (Rust `regex` syntax, matched case-insensitively)
    pub pattern: String,

    /// Human-readable reason shown when the rule matches
    pub message: String,

    /// Block or warn
    pub severity: Severity,

    /// Optional exclusion: vetoes a match when this pattern matches at the same position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unless: Option<String>,
}

impl PatternRule {
    /// Create a blocking rule
    pub fn block(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
            severity: Severity::Block,
            unless: None,
        }
    }

    /// Create a warning rule
    pub fn warn(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            message: message.into(),
            severity: Severity::Warn,
            unless: None,
        }
    }

    /// Exclude subjects that also match `pattern`
    pub fn unless(mut self, pattern: impl Into<String>) -> Self {
        self.unless = Some(pattern.into());
        self
    }
}

/// How patterns are applied to subjects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Match anywhere in the subject (shell commands)
    Search,
    /// Match must begin at the start of the subject (file paths)
    Anchored,
}

/// Compile one pattern in the given mode
pub fn compile_pattern(pattern: &str, mode: MatchMode) -> GuardResult<Regex> {
    let source = match mode {
        MatchMode::Search => pattern.to_string(),
        MatchMode::Anchored => format!("^(?:{})", pattern),
    };

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .map_err(|source| GuardError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// A rule that matched a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Source pattern of the rule
    pub pattern: String,
    /// Rule message
    pub message: String,
    /// Rule severity
    pub severity: Severity,
}

impl RuleMatch {
    /// Response `details` payload for this match
    pub fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert("pattern".to_string(), json!(self.pattern));
        details.insert("severity".to_string(), json!(self.severity));
        details
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: PatternRule,
    regex: Regex,
    unless: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: PatternRule, mode: MatchMode) -> GuardResult<Self> {
        let regex = compile_pattern(&rule.pattern, mode)?;
        // The exclusion is compiled unanchored and tested at each match start.
        let unless = rule
            .unless
            .as_deref()
            .map(|p| compile_pattern(p, MatchMode::Search))
            .transpose()?;

        Ok(Self { rule, regex, unless })
    }

    /// True if some occurrence of the pattern is not vetoed by the
    /// exclusion starting at the same position
    fn is_match(&self, subject: &str) -> bool {
        let Some(unless) = &self.unless else {
            return self.regex.is_match(subject);
        };
        self.regex.find_iter(subject).any(|found| {
            unless
                .find_at(subject, found.start())
                .map_or(true, |veto| veto.start() != found.start())
        })
    }

    fn to_match(&self) -> RuleMatch {
        RuleMatch {
            pattern: self.rule.pattern.clone(),
            message: self.rule.message.clone(),
            severity: self.rule.severity,
        }
    }
}

/// Ordered list of compiled rules
///
/// Malformed rules are dropped at compile time and logged; the remaining
/// rules keep their declaration order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    mode: MatchMode,
    rules: Vec<CompiledRule>,
    skipped: usize,
}

impl RuleSet {
    /// An empty rule set that never matches
    pub fn empty(mode: MatchMode) -> Self {
        Self {
            mode,
            rules: Vec::new(),
            skipped: 0,
        }
    }

    /// Compile rules, skipping (and logging) any that fail to compile
    pub fn compile(rules: impl IntoIterator<Item = PatternRule>, mode: MatchMode) -> Self {
        let mut set = Self::empty(mode);
        for rule in rules {
            match CompiledRule::compile(rule, mode) {
                Ok(compiled) => set.rules.push(compiled),
                Err(e) => {
                    tracing::error!("[RuleSet] Skipping malformed rule: {}", e);
                    set.skipped += 1;
                }
            }
        }
        set
    }

    /// Compile rules, failing on the first malformed one
    pub fn try_compile(
        rules: impl IntoIterator<Item = PatternRule>,
        mode: MatchMode,
    ) -> GuardResult<Self> {
        let rules = rules
            .into_iter()
            .map(|r| CompiledRule::compile(r, mode))
            .collect::<GuardResult<Vec<_>>>()?;

        Ok(Self {
            mode,
            rules,
            skipped: 0,
        })
    }

    /// Return the first rule (in declaration order) matching `subject`
    pub fn evaluate(&self, subject: &str) -> Option<RuleMatch> {
        self.evaluate_any(&[subject])
    }

    /// Return the first rule matching any of `subjects`
    ///
    /// Rules are the outer loop, so declaration order decides the winner
    /// regardless of which subject matched.
    pub fn evaluate_any(&self, subjects: &[&str]) -> Option<RuleMatch> {
        self.rules
            .iter()
            .find(|r| subjects.iter().any(|s| r.is_match(s)))
            .map(CompiledRule::to_match)
    }

    /// Return every rule matching `subject`, in declaration order
    pub fn matches_all(&self, subject: &str) -> Vec<RuleMatch> {
        self.rules
            .iter()
            .filter(|r| r.is_match(subject))
            .map(CompiledRule::to_match)
            .collect()
    }

    /// Match mode used when compiling
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Number of usable rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the set has no usable rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules dropped because they failed to compile
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Evaluate `subject` against `rules`, first match wins
pub fn evaluate(subject: &str, rules: &RuleSet) -> Option<RuleMatch> {
    rules.evaluate(subject)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_wins() {
        let rules = RuleSet::compile(
            vec![
                PatternRule::warn(r"rm", "first"),
                PatternRule::block(r"rm\s+-rf", "second"),
            ],
            MatchMode::Search,
        );

        let m = rules.evaluate("rm -rf build").unwrap();
        assert_eq!(m.message, "first");
        assert_eq!(m.severity, Severity::Warn);
    }

    #[test]
    fn test_no_match_returns_none() {
        let rules = RuleSet::compile(vec![PatternRule::block("mkfs", "format")], MatchMode::Search);
        assert!(rules.evaluate("ls -la").is_none());
        assert!(evaluate("ls", &RuleSet::empty(MatchMode::Search)).is_none());
    }

    #[test]
    fn test_case_insensitive() {
        let rules = RuleSet::compile(vec![PatternRule::block("mkfs", "format")], MatchMode::Search);
        assert!(rules.evaluate("MKFS.ext4 /dev/sda1").is_some());
    }

    #[test]
    fn test_anchored_mode() {
        let rules = RuleSet::compile(
            vec![PatternRule::block(r"\.env", "dotenv")],
            MatchMode::Anchored,
        );
        assert!(rules.evaluate(".env.local").is_some());
        assert!(rules.evaluate("config/.env").is_none());

        let search = RuleSet::compile(vec![PatternRule::block(r"\.env", "dotenv")], MatchMode::Search);
        assert!(search.evaluate("config/.env").is_some());
    }

    #[test]
    fn test_malformed_rule_skipped() {
        let rules = RuleSet::compile(
            vec![
                PatternRule::block("(unclosed", "broken"),
                PatternRule::block("dd\\s+if=", "disk"),
            ],
            MatchMode::Search,
        );

        assert_eq!(rules.len(), 1);
        assert_eq!(rules.skipped(), 1);
        assert_eq!(rules.evaluate("dd if=/dev/zero").unwrap().message, "disk");
    }

    #[test]
    fn test_try_compile_rejects_malformed() {
        let result = RuleSet::try_compile(
            vec![PatternRule::block("[a-", "broken")],
            MatchMode::Search,
        );
        assert!(matches!(result, Err(GuardError::InvalidPattern { .. })));
    }

    #[test]
    fn test_unless_excludes() {
        let rules = RuleSet::compile(
            vec![PatternRule::warn(r"\bsudo\s+", "sudo").unless(r"\bsudo\s+(?:apt|brew)\b")],
            MatchMode::Search,
        );
        assert!(rules.evaluate("sudo systemctl restart nginx").is_some());
        assert!(rules.evaluate("sudo apt install jq").is_none());
        assert!(rules.evaluate("sudo apt install jq; sudo reboot").is_some());
        assert!(rules.evaluate("echo apt && sudo reboot").is_some());
    }

    #[test]
    fn test_evaluate_any_respects_rule_order() {
        let rules = RuleSet::compile(
            vec![
                PatternRule::block(r"id_rsa", "ssh key"),
                PatternRule::block(r".*\.pub$", "public key"),
            ],
            MatchMode::Anchored,
        );
        let m = rules.evaluate_any(&["home/.ssh/id_rsa.pub", "id_rsa.pub"]).unwrap();
        assert_eq!(m.message, "ssh key");
    }

    #[test]
    fn test_matches_all_in_order() {
        let rules = RuleSet::compile(
            vec![
                PatternRule::warn(r"\bcat\s+.*\|\s*grep", "use rg file"),
                PatternRule::warn(r"\bgrep\s+[^|]*$", "use rg"),
                PatternRule::warn(r"\bfind\s+", "use fd"),
            ],
            MatchMode::Search,
        );
        let messages: Vec<_> = rules
            .matches_all("cat log.txt | grep error")
            .into_iter()
            .map(|m| m.message)
            .collect();
        assert_eq!(messages, vec!["use rg file", "use rg"]);
    }

    #[test]
    fn test_match_details() {
        let rules = RuleSet::compile(vec![PatternRule::block("mkfs", "format")], MatchMode::Search);
        let details = rules.evaluate("mkfs").unwrap().details();
        assert_eq!(details["pattern"], "mkfs");
        assert_eq!(details["severity"], "block");
    }

    #[test]
    fn test_rule_deserialize() {
        let rule: PatternRule =
            serde_json::from_str(r#"{"pattern":"x","message":"m","severity":"warn"}"#).unwrap();
        assert_eq!(rule, PatternRule::warn("x", "m"));
    }
}
