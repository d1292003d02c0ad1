//! Diagnostics setup
//!
//! Stdout carries the hook protocol, so human-readable logs go to stderr.
//! `BUDDY_GUARD_LOG` takes an `EnvFilter` directive (default `warn`);
//! `BUDDY_GUARD_LOG_FILE` additionally writes JSON lines to a file.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive variable
pub const LOG_ENV: &str = "BUDDY_GUARD_LOG";
/// Optional JSON log file variable
pub const LOG_FILE_ENV: &str = "BUDDY_GUARD_LOG_FILE";
/// Level used when `BUDDY_GUARD_LOG` is unset or invalid
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber
///
/// Keep the returned guard alive until exit, or buffered file output is lost.
pub fn init_logging() -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false);

    let (file_writer, guard) = match env::var_os(LOG_FILE_ENV) {
        Some(path) if !path.is_empty() => {
            let (dir, name) = split_log_path(Path::new(&path))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        _ => (None, None),
    };
    let file_layer = file_writer.map(|writer| fmt::layer().json().with_writer(writer).with_ansi(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(PathBuf, OsString)> {
    let name = path
        .file_name()
        .with_context(|| format!("{} does not name a file", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_os_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/buddy/guard.jsonl")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/buddy"));
        assert_eq!(name, OsString::from("guard.jsonl"));

        let (dir, _) = split_log_path(Path::new("guard.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));

        assert!(split_log_path(Path::new("/")).is_err());
    }
}
