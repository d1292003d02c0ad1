//! Auto-Formatter
//!
//! Post-write formatting pass. Every failure path (unsupported file, missing
//! tool, non-zero exit, timeout) returns the original content unchanged.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::{GuardError, GuardResult};

use super::config::{FormatConfig, FormatterSpec};

/// Outcome of a formatting pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatResult {
    /// Whether a formatter ran successfully
    pub formatted: bool,
    /// Formatted content, or the original content
    ///
    /// Empty when `format_file` skipped a file without reading it as text
    /// (over the size limit, or not UTF-8).
    pub content: String,
    /// Formatter that ran (or would have run)
    pub formatter: Option<String>,
    /// Why the content was left unchanged
    pub skipped: Option<String>,
}

impl FormatResult {
    fn unchanged(content: &str, reason: impl Into<String>) -> Self {
        Self {
            formatted: false,
            content: content.to_string(),
            formatter: None,
            skipped: Some(reason.into()),
        }
    }

    fn unread(reason: impl Into<String>) -> Self {
        Self::unchanged("", reason)
    }

    fn with_formatter(mut self, name: &str) -> Self {
        self.formatter = Some(name.to_string());
        self
    }
}

/// Format `content` as the file at `file_path` would be formatted
pub async fn format(file_path: &Path, content: &str, config: &FormatConfig) -> FormatResult {
    format_in(file_path, None, content, config).await
}

async fn format_in(
    file_path: &Path,
    project_root: Option<&Path>,
    content: &str,
    config: &FormatConfig,
) -> FormatResult {
    if !config.enabled {
        return FormatResult::unchanged(content, "auto-formatting disabled");
    }
    if !config.supports_extension(file_path) {
        return FormatResult::unchanged(content, "extension not configured for formatting");
    }
    if config.is_excluded_under(file_path, project_root) {
        return FormatResult::unchanged(content, "path matches an exclude pattern");
    }
    if content.len() as u64 > config.max_file_size_bytes() {
        return FormatResult::unchanged(
            content,
            format!("file larger than {} KB", config.max_file_size_kb),
        );
    }

    let Some(spec) = config.formatter_for(file_path) else {
        return FormatResult::unchanged(content, "no formatter for this extension");
    };

    match run_formatter(spec, file_path, content, config.timeout()).await {
        Ok(Some(output)) => {
            tracing::debug!("[AutoFormat] {} formatted {}", spec.name, file_path.display());
            FormatResult {
                formatted: true,
                content: output,
                formatter: Some(spec.name.clone()),
                skipped: None,
            }
        }
        Ok(None) => {
            tracing::debug!("[AutoFormat] {} not installed, skipping", spec.program);
            FormatResult::unchanged(content, format!("{} is not installed", spec.program))
                .with_formatter(&spec.name)
        }
        Err(e) => {
            tracing::warn!("[AutoFormat] {}", e);
            FormatResult::unchanged(content, e.to_string()).with_formatter(&spec.name)
        }
    }
}

/// Run one formatter over `content`
///
/// Returns `Ok(None)` when the executable does not exist.
async fn run_formatter(
    spec: &FormatterSpec,
    file_path: &Path,
    content: &str,
    limit: Duration,
) -> GuardResult<Option<String>> {
    let spawned = Command::new(&spec.program)
        .args(spec.args_for(file_path))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GuardError::hook_failed(&spec.name, e.to_string())),
    };

    // Feed stdin from a separate task so a large file cannot deadlock
    // against a full stdout pipe.
    if let Some(mut stdin) = child.stdin.take() {
        let input = content.as_bytes().to_vec();
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&input).await {
                tracing::debug!("[AutoFormat] Formatter closed stdin early: {}", e);
            }
        });
    }

    // Dropping the future on timeout drops the child, which kills it.
    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(GuardError::HookTimeout {
                hook: spec.name.clone(),
                timeout: limit,
            })
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GuardError::hook_failed(
            &spec.name,
            format!("exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    let formatted = String::from_utf8(output.stdout)
        .map_err(|_| GuardError::hook_failed(&spec.name, "output is not valid UTF-8"))?;

    if formatted.trim().is_empty() && !content.trim().is_empty() {
        return Err(GuardError::hook_failed(&spec.name, "produced empty output"));
    }

    Ok(Some(formatted))
}

/// Format a file on disk in place
///
/// The file is only rewritten when the formatted content differs, and the
/// replacement is atomic (temp file in the same directory, then rename).
pub async fn format_file(file_path: &Path, config: &FormatConfig) -> GuardResult<FormatResult> {
    format_file_in(file_path, None, config).await
}

/// Format a file on disk in place, matching excludes relative to
/// `project_root`
pub async fn format_file_in(
    file_path: &Path,
    project_root: Option<&Path>,
    config: &FormatConfig,
) -> GuardResult<FormatResult> {
    let metadata = fs::metadata(file_path)?;
    if metadata.len() > config.max_file_size_bytes() {
        return Ok(FormatResult::unread(format!(
            "file larger than {} KB",
            config.max_file_size_kb
        )));
    }

    let original = match fs::read_to_string(file_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            return Ok(FormatResult::unread("file is not valid UTF-8"));
        }
        Err(e) => return Err(e.into()),
    };

    let result = format_in(file_path, project_root, &original, config).await;
    if result.formatted && result.content != original {
        replace_atomically(file_path, &result.content, &metadata)?;
        tracing::info!(
            "[AutoFormat] Rewrote {} with {}",
            file_path.display(),
            result.formatter.as_deref().unwrap_or("formatter")
        );
    }

    Ok(result)
}

fn replace_atomically(file_path: &Path, content: &str, metadata: &fs::Metadata) -> GuardResult<()> {
    let dir = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    fs::set_permissions(temp.path(), metadata.permissions())?;
    temp.persist(file_path).map_err(|e| GuardError::Io(e.error))?;

    Ok(())
}
