//! Formatter configuration
//!
//! The `auto_formatting` config section plus the extension → external
//! formatter table.

use std::path::Path;
use std::time::Duration;

use glob::Pattern;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the file path in formatter arguments
pub const PATH_PLACEHOLDER: &str = "{path}";

/// One external formatter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterSpec {
    /// Display name
    pub name: String,
    /// File extensions handled (without the dot)
    pub extensions: Vec<String>,
    /// Executable
    pub program: String,
    /// Arguments; `{path}` is substituted with the file path
    #[serde(default)]
    pub args: Vec<String>,
}

impl FormatterSpec {
    /// Create a formatter entry
    pub fn new(name: &str, extensions: &[&str], program: &str, args: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Check whether this formatter handles `extension`
    pub fn handles(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }

    /// Arguments with the path substituted
    pub fn args_for(&self, path: &Path) -> Vec<String> {
        let path = path.to_string_lossy();
        self.args
            .iter()
            .map(|a| a.replace(PATH_PLACEHOLDER, &path))
            .collect()
    }
}

/// `auto_formatting` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Whether formatting runs at all
    pub enabled: bool,

    /// Extensions eligible for formatting (without the dot)
    pub extensions: Vec<String>,

    /// Paths never formatted: globs, or plain path segments/substrings
    pub exclude_patterns: Vec<String>,

    /// Files larger than this are left alone
    pub max_file_size_kb: u64,

    /// Formatter time limit
    pub timeout_seconds: u64,

    /// Extension → formatter table, first match wins
    pub formatters: Vec<FormatterSpec>,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extensions: [
                "rs", "py", "js", "jsx", "ts", "tsx", "json", "css", "scss", "md", "yaml", "yml",
                "html", "go", "sh",
            ]
            .iter()
            .map(|e| e.to_string())
            .collect(),
            exclude_patterns: ["node_modules/", "target/", "dist/", "build/", "vendor/", ".git/"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_file_size_kb: 1024,
            timeout_seconds: 30,
            formatters: default_formatters(),
        }
    }
}

/// Built-in formatter table
pub fn default_formatters() -> Vec<FormatterSpec> {
    vec![
        FormatterSpec::new("rustfmt", &["rs"], "rustfmt", &["--edition", "2021", "--emit", "stdout"]),
        FormatterSpec::new("black", &["py"], "black", &["-q", "-"]),
        FormatterSpec::new(
            "prettier",
            &[
                "js", "jsx", "ts", "tsx", "json", "css", "scss", "md", "yaml", "yml", "html",
            ],
            "prettier",
            &["--stdin-filepath", PATH_PLACEHOLDER],
        ),
        FormatterSpec::new("gofmt", &["go"], "gofmt", &[]),
        FormatterSpec::new("shfmt", &["sh"], "shfmt", &["-filename", PATH_PLACEHOLDER]),
    ]
}

impl FormatConfig {
    /// Formatter time limit
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Size limit in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_kb.saturating_mul(1024)
    }

    /// Check whether the path's extension is eligible
    pub fn supports_extension(&self, path: &Path) -> bool {
        extension_of(path)
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)))
            .unwrap_or(false)
    }

    /// Check whether the path matches an exclude pattern
    pub fn is_excluded(&self, path: &Path) -> bool {
        let text = path.to_string_lossy().replace('\\', "/");
        self.exclude_patterns
            .iter()
            .any(|pattern| exclude_matches(pattern, &text))
    }

    /// Check excludes against the path relative to `project_root`
    ///
    /// Directories above the project root never trigger an exclude. Paths
    /// outside the root are matched as given.
    pub fn is_excluded_under(&self, path: &Path, project_root: Option<&Path>) -> bool {
        let relative = project_root
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        self.is_excluded(relative)
    }

    /// Pick the formatter for a path
    pub fn formatter_for(&self, path: &Path) -> Option<&FormatterSpec> {
        let ext = extension_of(path)?;
        self.formatters.iter().find(|f| f.handles(&ext))
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_string())
}

fn exclude_matches(pattern: &str, path: &str) -> bool {
    if pattern.contains(['*', '?', '[']) {
        return match Pattern::new(pattern) {
            Ok(glob) => glob.matches(path),
            Err(e) => {
                tracing::error!("[AutoFormat] Skipping malformed exclude pattern '{}': {}", pattern, e);
                false
            }
        };
    }

    // Plain entries match as a directory segment ("target/") or substring.
    let segment = pattern.trim_end_matches('/');
    if pattern.ends_with('/') {
        path.starts_with(pattern) || path.contains(&format!("/{}/", segment))
    } else {
        path.contains(pattern)
    }
}
