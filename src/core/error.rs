//! Guard error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while loading policy or running hooks
#[derive(Error, Debug)]
pub enum GuardError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration or registration file exists but cannot be used
    #[error("Invalid configuration in {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    /// A rule, whitelist entry, or matcher failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A hook did not answer within its timeout
    #[error("Hook '{hook}' timed out after {}s", timeout.as_secs())]
    HookTimeout { hook: String, timeout: Duration },

    /// A hook crashed, exited with an unexpected status, or could not be spawned
    #[error("Hook '{hook}' failed: {reason}")]
    HookFailed { hook: String, reason: String },

    /// A hook produced output that is not a valid response envelope
    #[error("Hook '{hook}' returned a malformed response: {reason}")]
    MalformedResponse { hook: String, reason: String },
}

impl GuardError {
    /// Create a hook failure error
    pub fn hook_failed(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardError::HookFailed {
            hook: hook.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GuardError::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for guard operations
pub type GuardResult<T> = Result<T, GuardError>;
