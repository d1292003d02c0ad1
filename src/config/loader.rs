//! Configuration discovery and loading

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{GuardError, GuardResult};

use super::settings::BuddyConfig;

/// Project-relative and home-relative locations, in lookup order
const CONFIG_LOCATIONS: [(bool, &str); 4] = [
    (false, ".claude-buddy/config.json"),
    (true, ".claude-buddy/config.json"),
    (false, ".claude/buddy-config.json"),
    (true, ".claude/buddy-config.json"),
];

/// A configuration together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    /// Parsed configuration
    pub config: BuddyConfig,
    /// File it was read from (None = built-in defaults)
    pub source: Option<PathBuf>,
}

/// Candidate config files for a project directory
pub fn candidate_paths(project_dir: &Path) -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);

    CONFIG_LOCATIONS
        .iter()
        .filter_map(|(in_home, relative)| {
            if *in_home {
                home.as_ref().map(|h| h.join(relative))
            } else {
                Some(project_dir.join(relative))
            }
        })
        .collect()
}

/// Load configuration from an explicit file
///
/// A file that exists but does not parse is an error, never a silent
/// fallback to defaults.
pub fn load_from_path(path: &Path) -> GuardResult<LoadedConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| GuardError::invalid_config(path, format!("cannot read file: {}", e)))?;

    let config = BuddyConfig::from_json(&content)
        .map_err(|e| GuardError::invalid_config(path, e.to_string()))?;

    tracing::debug!("[Config] Loaded policy from {}", path.display());

    Ok(LoadedConfig {
        config,
        source: Some(path.to_path_buf()),
    })
}

/// Load the first config file found for `project_dir`, or defaults
pub fn load_config(project_dir: &Path) -> GuardResult<LoadedConfig> {
    for path in candidate_paths(project_dir) {
        if path.is_file() {
            return load_from_path(&path);
        }
    }

    tracing::debug!("[Config] No config file found, using defaults");
    Ok(LoadedConfig {
        config: BuddyConfig::default(),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_candidate_order() {
        let paths = candidate_paths(Path::new("/project"));
        assert_eq!(paths[0], PathBuf::from("/project/.claude-buddy/config.json"));
        assert!(paths
            .iter()
            .any(|p| p == Path::new("/project/.claude/buddy-config.json")));
    }

    #[test]
    fn test_load_project_config() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".claude-buddy")).unwrap();
        fs::write(
            dir.path().join(".claude-buddy/config.json"),
            r#"{"file_protection": {"strict_mode": true}}"#,
        )
        .unwrap();

        let loaded = load_config(dir.path()).unwrap();
        assert!(loaded.config.file_protection.strict_mode);
        assert_eq!(
            loaded.source,
            Some(dir.path().join(".claude-buddy/config.json"))
        );
    }

    #[test]
    fn test_project_config_wins_over_secondary_location() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".claude-buddy")).unwrap();
        fs::create_dir_all(dir.path().join(".claude")).unwrap();
        fs::write(
            dir.path().join(".claude-buddy/config.json"),
            r#"{"command_validation": {"enabled": false}}"#,
        )
        .unwrap();
        fs::write(dir.path().join(".claude/buddy-config.json"), "{}").unwrap();

        let loaded = load_config(dir.path()).unwrap();
        assert!(!loaded.config.command_validation.enabled);
    }

    #[test]
    fn test_unparsable_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, GuardError::InvalidConfig { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_from_path(&dir.path().join("absent.json")).is_err());
    }
}
