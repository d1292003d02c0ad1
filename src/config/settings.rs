//! Policy configuration file types
//!
//! Mirrors the JSON layout of `.claude-buddy/config.json`. Every field has a
//! default, so a partial file (or no file at all) is valid.

use serde::{Deserialize, Serialize};

use crate::format::FormatConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuddyConfig {
    /// Sensitive file protection
    pub file_protection: FileProtectionConfig,

    /// Dangerous command validation
    pub command_validation: CommandValidationConfig,

    /// Post-write formatting
    pub auto_formatting: FormatConfig,
}

impl BuddyConfig {
    /// Parse a configuration document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// `file_protection` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProtectionConfig {
    /// Whether file protection runs at all
    pub enabled: bool,

    /// Extra protected path patterns, appended after the built-ins
    pub additional_patterns: Vec<String>,

    /// Paths exempt from protection (ignored in strict mode)
    pub whitelist_patterns: Vec<String>,

    /// Disable the whitelist
    pub strict_mode: bool,
}

impl Default for FileProtectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            additional_patterns: Vec::new(),
            whitelist_patterns: Vec::new(),
            strict_mode: false,
        }
    }
}

/// `command_validation` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandValidationConfig {
    /// Whether command validation runs at all
    pub enabled: bool,

    /// Evaluate the blocking tier
    pub block_dangerous: bool,

    /// Evaluate the performance warning tier
    pub warn_performance: bool,

    /// Evaluate best-practice suggestions
    pub suggest_best_practices: bool,

    /// Extra blocking patterns, appended after the built-ins
    pub additional_dangerous_patterns: Vec<String>,

    /// Commands exempt from validation (ignored in strict mode)
    pub whitelist_patterns: Vec<String>,

    /// Disable the whitelist
    pub strict_mode: bool,
}

impl Default for CommandValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_dangerous: true,
            warn_performance: true,
            suggest_best_practices: true,
            additional_dangerous_patterns: Vec::new(),
            whitelist_patterns: Vec::new(),
            strict_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BuddyConfig::from_json("{}").unwrap();
        assert_eq!(config, BuddyConfig::default());
        assert!(config.file_protection.enabled);
        assert!(config.command_validation.block_dangerous);
        assert!(config.auto_formatting.enabled);
    }

    #[test]
    fn test_partial_section() {
        let config = BuddyConfig::from_json(
            r#"{
                "file_protection": { "strict_mode": true, "whitelist_patterns": ["test/\\.env\\.test"] },
                "command_validation": { "warn_performance": false }
            }"#,
        )
        .unwrap();

        assert!(config.file_protection.enabled);
        assert!(config.file_protection.strict_mode);
        assert_eq!(config.file_protection.whitelist_patterns, vec!["test/\\.env\\.test"]);
        assert!(!config.command_validation.warn_performance);
        assert!(config.command_validation.suggest_best_practices);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let config = BuddyConfig::from_json(r#"{"personas": {"default": "architect"}}"#).unwrap();
        assert_eq!(config, BuddyConfig::default());
    }

    #[test]
    fn test_wrong_type_is_error() {
        assert!(BuddyConfig::from_json(r#"{"file_protection": {"enabled": "yes"}}"#).is_err());
    }
}
