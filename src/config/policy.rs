//! Compiled, immutable policy snapshots
//!
//! A `PolicySnapshot` is built once per invocation from a `BuddyConfig` and
//! shared read-only (behind `Arc`) by every hook of that invocation.

use std::path::PathBuf;

use crate::format::FormatConfig;
use crate::rules::{defaults, MatchMode, PatternRule, RuleSet, Whitelist};

use super::loader::LoadedConfig;
use super::settings::{BuddyConfig, CommandValidationConfig, FileProtectionConfig};

/// Protection policy for one subject domain
#[derive(Debug, Clone)]
pub struct ProtectionPolicy {
    /// Whether the domain is checked at all
    pub enabled: bool,
    /// Ordered rules, built-ins first
    pub patterns: RuleSet,
    /// Allow-list (ignored in strict mode)
    pub whitelist: Whitelist,
    /// Disable the whitelist
    pub strict_mode: bool,
}

impl ProtectionPolicy {
    /// Compile the file protection section
    pub fn for_files(config: &FileProtectionConfig) -> Self {
        let rules = defaults::protected_file_rules().into_iter().chain(
            config
                .additional_patterns
                .iter()
                .map(|p| PatternRule::block(p.as_str(), defaults::CUSTOM_FILE_MESSAGE)),
        );

        Self {
            enabled: config.enabled,
            patterns: RuleSet::compile(rules, MatchMode::Anchored),
            whitelist: Whitelist::compile(&config.whitelist_patterns, MatchMode::Anchored),
            strict_mode: config.strict_mode,
        }
    }

    /// A policy that approves everything
    pub fn disabled(mode: MatchMode) -> Self {
        Self {
            enabled: false,
            patterns: RuleSet::empty(mode),
            whitelist: Whitelist::empty(),
            strict_mode: false,
        }
    }
}

/// Command validation policy: one blocking tier and two advisory tiers
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    /// Whether commands are checked at all
    pub enabled: bool,
    /// Commands denied outright
    pub blocking: RuleSet,
    /// Performance and caution warnings
    pub warnings: RuleSet,
    /// Best-practice suggestions
    pub suggestions: RuleSet,
    /// Allow-list (ignored in strict mode)
    pub whitelist: Whitelist,
    /// Disable the whitelist
    pub strict_mode: bool,
}

impl CommandPolicy {
    /// Compile the command validation section
    ///
    /// User patterns are appended after the built-in blocking rules.
    pub fn compile(config: &CommandValidationConfig) -> Self {
        let blocking = if config.block_dangerous {
            let rules = defaults::dangerous_command_rules().into_iter().chain(
                config
                    .additional_dangerous_patterns
                    .iter()
                    .map(|p| PatternRule::block(p.as_str(), defaults::CUSTOM_COMMAND_MESSAGE)),
            );
            RuleSet::compile(rules, MatchMode::Search)
        } else {
            RuleSet::empty(MatchMode::Search)
        };

        let warnings = if config.warn_performance {
            RuleSet::compile(defaults::performance_warning_rules(), MatchMode::Search)
        } else {
            RuleSet::empty(MatchMode::Search)
        };

        let suggestions = if config.suggest_best_practices {
            RuleSet::compile(defaults::best_practice_rules(), MatchMode::Search)
        } else {
            RuleSet::empty(MatchMode::Search)
        };

        Self {
            enabled: config.enabled,
            blocking,
            warnings,
            suggestions,
            whitelist: Whitelist::compile(&config.whitelist_patterns, MatchMode::Search),
            strict_mode: config.strict_mode,
        }
    }
}

/// Everything one invocation needs, compiled up front
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    /// File protection policy
    pub file_protection: ProtectionPolicy,
    /// Command validation policy
    pub command_validation: CommandPolicy,
    /// Formatting settings
    pub auto_formatting: FormatConfig,
    /// Config file the snapshot was built from
    pub source: Option<PathBuf>,
}

impl PolicySnapshot {
    /// Compile a configuration
    pub fn compile(config: &BuddyConfig) -> Self {
        Self {
            file_protection: ProtectionPolicy::for_files(&config.file_protection),
            command_validation: CommandPolicy::compile(&config.command_validation),
            auto_formatting: config.auto_formatting.clone(),
            source: None,
        }
    }

    /// Compile a loaded configuration, keeping its source path
    pub fn from_loaded(loaded: &LoadedConfig) -> Self {
        let mut snapshot = Self::compile(&loaded.config);
        snapshot.source = loaded.source.clone();
        snapshot
    }
}

impl Default for PolicySnapshot {
    fn default() -> Self {
        Self::compile(&BuddyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let snapshot = PolicySnapshot::default();
        assert!(snapshot.file_protection.enabled);
        assert_eq!(
            snapshot.file_protection.patterns.len(),
            defaults::protected_file_rules().len()
        );
        assert!(!snapshot.command_validation.blocking.is_empty());
        assert!(!snapshot.command_validation.warnings.is_empty());
        assert!(snapshot.source.is_none());
    }

    #[test]
    fn test_additional_patterns_appended() {
        let config = FileProtectionConfig {
            additional_patterns: vec![r".*\.tfstate$".into(), "(broken".into()],
            ..Default::default()
        };
        let policy = ProtectionPolicy::for_files(&config);

        assert_eq!(policy.patterns.len(), defaults::protected_file_rules().len() + 1);
        assert_eq!(policy.patterns.skipped(), 1);
        let m = policy.patterns.evaluate("prod.tfstate").unwrap();
        assert_eq!(m.message, defaults::CUSTOM_FILE_MESSAGE);
    }

    #[test]
    fn test_builtins_evaluated_before_custom_commands() {
        let config = CommandValidationConfig {
            additional_dangerous_patterns: vec![r"rm\s+-rf".into()],
            ..Default::default()
        };
        let policy = CommandPolicy::compile(&config);

        let m = policy.blocking.evaluate("rm -rf /").unwrap();
        assert_eq!(m.message, "Recursive deletion from root directory");
        let m = policy.blocking.evaluate("rm -rf ./build").unwrap();
        assert_eq!(m.message, defaults::CUSTOM_COMMAND_MESSAGE);
    }

    #[test]
    fn test_disabled_tiers_are_empty() {
        let config = CommandValidationConfig {
            block_dangerous: false,
            warn_performance: false,
            suggest_best_practices: false,
            ..Default::default()
        };
        let policy = CommandPolicy::compile(&config);
        assert!(policy.blocking.is_empty());
        assert!(policy.warnings.is_empty());
        assert!(policy.suggestions.is_empty());
    }
}
